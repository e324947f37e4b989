//! Markup fragment parsing for `set_inner_html`.
//!
//! Fragments are read with `quick-xml` in a lenient configuration: end tag
//! names are not checked, attributes may be unquoted or valueless, and the
//! HTML void elements never take children.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed fragment node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HtmlNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<HtmlNode>,
    },
    Text(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse a markup fragment into a forest of nodes.
pub(crate) fn parse_fragment(html: &str) -> Result<Vec<HtmlNode>, quick_xml::Error> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    // Open elements: (tag, attributes, children). Index 0 collects the roots.
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<HtmlNode>)> =
        vec![(String::new(), Vec::new(), Vec::new())];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let (tag, attributes) = read_start(&start);
                if is_void(&tag) {
                    push_child(&mut stack, HtmlNode::Element { tag, attributes, children: Vec::new() });
                } else {
                    stack.push((tag, attributes, Vec::new()));
                }
            }
            Event::Empty(start) => {
                let (tag, attributes) = read_start(&start);
                push_child(&mut stack, HtmlNode::Element { tag, attributes, children: Vec::new() });
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if is_void(&name) || !stack.iter().skip(1).any(|(tag, _, _)| *tag == name) {
                    continue;
                }
                // Close implicitly every element opened after the matching one.
                while stack.len() > 1 {
                    let Some((tag, attributes, children)) = stack.pop() else {
                        break;
                    };
                    let matched = tag == name;
                    push_child(&mut stack, HtmlNode::Element { tag, attributes, children });
                    if matched {
                        break;
                    }
                }
            }
            Event::Text(text) => {
                let content = match text.unescape() {
                    Ok(content) => content.into_owned(),
                    Err(_) => String::from_utf8_lossy(&text).into_owned(),
                };
                // Formatting whitespace between tags is not content
                if !content.trim().is_empty() {
                    push_child(&mut stack, HtmlNode::Text(content));
                }
            }
            Event::CData(cdata) => {
                push_child(&mut stack, HtmlNode::Text(String::from_utf8_lossy(&cdata).into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Unclosed elements are closed at the end of input.
    while stack.len() > 1 {
        let Some((tag, attributes, children)) = stack.pop() else {
            break;
        };
        push_child(&mut stack, HtmlNode::Element { tag, attributes, children });
    }
    Ok(stack.pop().map(|(_, _, roots)| roots).unwrap_or_default())
}

fn push_child(stack: &mut [(String, Vec<(String, String)>, Vec<HtmlNode>)], node: HtmlNode) {
    if let Some((_, _, children)) = stack.last_mut() {
        children.push(node);
    }
}

fn read_start(start: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attributes = start
        .html_attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            (key, value)
        })
        .collect();
    (tag, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<HtmlNode>) -> HtmlNode {
        HtmlNode::Element {
            tag: tag.into(),
            attributes: attributes.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect(),
            children,
        }
    }

    #[test]
    fn test_parse_nested_fragment() {
        let nodes = parse_fragment("<h2 id=\"title\">Hello</h2><p>Body <a href=\"/x\">link</a></p>").unwrap();
        assert_eq!(
            nodes,
            vec![
                element("h2", &[("id", "title")], vec![HtmlNode::Text("Hello".into())]),
                element(
                    "p",
                    &[],
                    vec![
                        HtmlNode::Text("Body ".into()),
                        element("a", &[("href", "/x")], vec![HtmlNode::Text("link".into())]),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn test_inline_whitespace_is_kept() {
        let nodes = parse_fragment("<p>Hello <b>world</b> again</p>").unwrap();
        assert_eq!(
            nodes,
            vec![element(
                "p",
                &[],
                vec![
                    HtmlNode::Text("Hello ".into()),
                    element("b", &[], vec![HtmlNode::Text("world".into())]),
                    HtmlNode::Text(" again".into()),
                ]
            )]
        );
    }

    #[test]
    fn test_whitespace_only_text_is_dropped() {
        let nodes = parse_fragment("\n<ul>\n    <li>One</li>\n    <li>Two</li>\n</ul>\n").unwrap();
        assert_eq!(nodes.len(), 1);
        let HtmlNode::Element { children, .. } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_void_and_valueless_attributes() {
        let nodes = parse_fragment("<div><img src=a.png><input disabled></div>").unwrap();
        assert_eq!(
            nodes,
            vec![element(
                "div",
                &[],
                vec![
                    element("img", &[("src", "a.png")], vec![]),
                    element("input", &[("disabled", "")], vec![]),
                ]
            )]
        );
    }

    #[test]
    fn test_unclosed_elements_are_closed() {
        let nodes = parse_fragment("<ul><li>One<li>Two</ul>").unwrap();
        let HtmlNode::Element { tag, children, .. } = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(tag, "ul");
        assert_eq!(children.len(), 1);
    }
}
