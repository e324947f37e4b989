//! Selector parsing and matching for the in-memory document.
//!
//! Supports the subset used by the engines and by page markup:
//! type (`div`), universal (`*`), id (`#modal`), class (`.is-active`),
//! attribute presence (`[data-slider]`), attribute value
//! (`[data-modal-type="image"]`), descendant chains (`nav a[href]`) and
//! comma separated groups.

use std::fmt;

use cssparser::{BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, Token};

use super::NodeId;

/// Error produced while parsing a selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    /// The selector that failed to parse.
    pub selector: String,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector '{}': {}", self.selector, self.message)
    }
}

impl std::error::Error for SelectorError {}

/// Attribute constraint inside `[...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Attribute name.
    pub name: String,
    /// Required value, or `None` for a presence test.
    pub value: Option<String>,
}

/// A compound selector segment (e.g. `a.button[href]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorPart {
    /// Tag name, `None` for universal or omitted.
    pub tag: Option<String>,
    /// ID selector (`#id`).
    pub id: Option<String>,
    /// Class selectors (`.class`).
    pub classes: Vec<String>,
    /// Attribute selectors (`[name]`, `[name=value]`).
    pub attributes: Vec<AttributeSelector>,
}

impl SelectorPart {
    /// Create an empty part that matches every element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a tag name.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into().to_ascii_lowercase());
        self
    }

    /// Restrict to an id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Require a class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Require an attribute, optionally with an exact value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.attributes.push(AttributeSelector {
            name: name.into(),
            value: value.map(str::to_owned),
        });
        self
    }

    fn matches<C: MatchContext + ?Sized>(&self, node: NodeId, ctx: &C) -> bool {
        if let Some(tag) = &self.tag {
            if ctx.element_tag(node) != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if ctx.element_attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| ctx.element_has_class(node, class)) {
            return false;
        }
        self.attributes.iter().all(|attr| match (&attr.value, ctx.element_attribute(node, &attr.name)) {
            (None, found) => found.is_some(),
            (Some(expected), Some(found)) => expected == found,
            (Some(_), None) => false,
        })
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty() => {
                write!(f, "*")?
            }
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attributes {
            match &attr.value {
                Some(value) => write!(f, "[{}=\"{}\"]", attr.name, value)?,
                None => write!(f, "[{}]", attr.name)?,
            }
        }
        Ok(())
    }
}

/// Element access needed to evaluate a selector.
pub trait MatchContext {
    /// Lowercase tag name.
    fn element_tag(&self, node: NodeId) -> Option<&str>;
    /// Attribute value.
    fn element_attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    /// Class membership.
    fn element_has_class(&self, node: NodeId, class: &str) -> bool;
    /// Parent element.
    fn element_parent(&self, node: NodeId) -> Option<NodeId>;
}

/// A parsed selector list.
///
/// Each group is a descendant chain; the last part of a chain is the subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    groups: Vec<Vec<SelectorPart>>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser_input = ParserInput::new(input);
        let mut parser = Parser::new(&mut parser_input);
        let groups = parser
            .parse_comma_separated(|p| parse_chain(p))
            .map_err(|e| SelectorError {
                selector: input.to_owned(),
                message: describe_error(e),
            })?;
        Ok(Self { groups })
    }

    /// Whether `node` matches any group of this selector.
    pub fn matches<C: MatchContext + ?Sized>(&self, node: NodeId, ctx: &C) -> bool {
        self.groups.iter().any(|chain| matches_chain(chain, node, ctx))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.groups.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            for (j, part) in chain.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{part}")?;
            }
        }
        Ok(())
    }
}

fn matches_chain<C: MatchContext + ?Sized>(chain: &[SelectorPart], node: NodeId, ctx: &C) -> bool {
    let Some((subject, ancestors)) = chain.split_last() else {
        return false;
    };
    if !subject.matches(node, ctx) {
        return false;
    }

    // Greedy right-to-left walk up the ancestor chain.
    let mut current = ctx.element_parent(node);
    for part in ancestors.iter().rev() {
        loop {
            match current {
                Some(ancestor) => {
                    current = ctx.element_parent(ancestor);
                    if part.matches(ancestor, ctx) {
                        break;
                    }
                }
                None => return false,
            }
        }
    }
    true
}

type ParseResult<'i, T> = Result<T, ParseError<'i, String>>;

/// Parse one descendant chain up to the next comma.
fn parse_chain<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<SelectorPart>> {
    let mut chain = Vec::new();
    let mut part: Option<SelectorPart> = None;

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            // Whitespace ends the current compound
            Token::WhiteSpace(_) => chain.extend(part.take()),
            Token::Ident(name) if part.is_none() => {
                part = Some(SelectorPart::new().with_tag(&*name));
            }
            Token::Delim('*') if part.is_none() => part = Some(SelectorPart::new()),
            Token::IDHash(id) => {
                let current = part.get_or_insert_with(SelectorPart::new);
                if current.id.is_some() {
                    return Err(parser.new_custom_error("more than one id in a compound"));
                }
                current.id = Some(id.to_string());
            }
            Token::Delim('.') => {
                let class = match parser.next_including_whitespace()?.clone() {
                    Token::Ident(class) => class.to_string(),
                    _ => return Err(parser.new_custom_error("expected class name after '.'")),
                };
                part.get_or_insert_with(SelectorPart::new).classes.push(class);
            }
            Token::SquareBracketBlock => {
                let attribute = parser.parse_nested_block(|p| parse_attribute(p))?;
                part.get_or_insert_with(SelectorPart::new).attributes.push(attribute);
            }
            other => return Err(parser.new_unexpected_token_error(other)),
        }
    }

    chain.extend(part);
    if chain.is_empty() {
        return Err(parser.new_custom_error("empty selector group"));
    }
    Ok(chain)
}

/// Parse the inside of `[...]`.
fn parse_attribute<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, AttributeSelector> {
    let name = parser.expect_ident()?.to_string();
    if parser.is_exhausted() {
        return Ok(AttributeSelector { name, value: None });
    }

    parser.expect_delim('=')?;
    let value = match parser.next()?.clone() {
        Token::Ident(value) | Token::QuotedString(value) => value.to_string(),
        Token::Number { int_value: Some(value), .. } => value.to_string(),
        other => return Err(parser.new_unexpected_token_error(other)),
    };
    parser.expect_exhausted()?;
    Ok(AttributeSelector { name, value: Some(value) })
}

fn describe_error(error: ParseError<'_, String>) -> String {
    let column = error.location.column;
    match error.kind {
        ParseErrorKind::Custom(message) => format!("{message} at column {column}"),
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            format!("unexpected end of input at column {column}")
        }
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected {token:?} at column {column}")
        }
        ParseErrorKind::Basic(other) => format!("{other:?} at column {column}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound() {
        let selector = Selector::parse("a.button.is-active[href]").unwrap();
        assert_eq!(
            selector.groups[0][0],
            SelectorPart::new()
                .with_tag("a")
                .with_class("button")
                .with_class("is-active")
                .with_attribute("href", None)
        );
    }

    #[test]
    fn test_parse_attribute_values() {
        let selector = Selector::parse("[data-modal-type=\"image\"], [tabindex='-1'], [role=dialog]").unwrap();
        assert_eq!(selector.groups.len(), 3);
        assert_eq!(selector.groups[0][0].attributes[0].value.as_deref(), Some("image"));
        assert_eq!(selector.groups[1][0].attributes[0].value.as_deref(), Some("-1"));
        assert_eq!(selector.groups[2][0].attributes[0].value.as_deref(), Some("dialog"));
    }

    #[test]
    fn test_parse_descendant_chain() {
        let selector = Selector::parse("nav  [data-nav-item]").unwrap();
        assert_eq!(selector.groups[0].len(), 2);
        assert_eq!(selector.to_string(), "nav [data-nav-item]");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("[=x]").is_err());
        assert!(Selector::parse("[data-x=]").is_err());
        assert!(Selector::parse("a > b").is_err());
        assert!(Selector::parse("a b c,").is_err());
    }

    #[test]
    fn test_parse_numeric_attribute_value() {
        let selector = Selector::parse("[data-slider-slide-to=2]").unwrap();
        assert_eq!(selector.groups[0][0].attributes[0].value.as_deref(), Some("2"));
    }

    #[test]
    fn test_error_message_names_selector() {
        let err = Selector::parse(".").unwrap_err();
        assert_eq!(err.selector, ".");
        assert!(err.to_string().starts_with("invalid selector '.'"));
    }
}
