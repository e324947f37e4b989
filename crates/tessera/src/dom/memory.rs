//! In-memory host document.
//!
//! A complete [`Document`] used by the test suites and by headless demos.
//! Geometry is whatever the caller assigns with [`MemoryDocument::set_size`];
//! nothing is laid out.
//!
//! # Example
//!
//! ```
//! use tessera::dom::{Document, FocusProvider, MemoryDocument};
//!
//! let mut doc = MemoryDocument::from_body_html(r#"<button id="go">Go</button>"#);
//! let body = doc.body();
//! let button = doc.query_selector(body, "#go").unwrap();
//! doc.focus(button);
//! assert_eq!(doc.active_element(), Some(button));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use slotmap::SlotMap;
use tessera_core::logging::targets;
use tessera_core::{TimerId, TimerQueue};

use super::html::{parse_fragment, HtmlNode};
use super::selector::{MatchContext, Selector};
use super::{
    Capabilities, Document, EventKind, FocusProvider, Geometry, ListenerEntry, ListenerOwner,
    NodeId,
};

const TEXT_TAG: &str = "#text";

/// Tags that take focus without any attribute.
const NATIVE_FOCUSABLE: &[&str] = &["input", "select", "textarea", "button"];

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: Option<String>,
    width: f64,
    bounding_width: Option<f64>,
    height: f64,
}

impl NodeData {
    fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    fn text(content: &str) -> Self {
        Self {
            tag: TEXT_TAG.to_owned(),
            text: Some(content.to_owned()),
            ..Default::default()
        }
    }

    fn is_element(&self) -> bool {
        self.text.is_none()
    }
}

/// A host document held entirely in memory.
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
    listeners: Vec<ListenerEntry>,
    timers: TimerQueue,
    timer_owners: HashMap<TimerId, ListenerOwner>,
    capabilities: Capabilities,
    media: HashMap<String, bool>,
    online: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document containing `html` and `body`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::element("html"));
        let body = nodes.insert(NodeData::element("body"));
        nodes[body].parent = Some(root);
        nodes[root].children.push(body);
        Self {
            nodes,
            root,
            body,
            focused: None,
            listeners: Vec::new(),
            timers: TimerQueue::new(),
            timer_owners: HashMap::new(),
            capabilities: Capabilities::default(),
            media: HashMap::new(),
            online: true,
        }
    }

    /// Create a document whose body holds the parsed markup.
    pub fn from_body_html(html: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body;
        doc.set_inner_html(body, html);
        doc
    }

    // =========================================================================
    // Test and host controls
    // =========================================================================

    /// Assign the layout size of an element.
    pub fn set_size(&mut self, node: NodeId, width: f64, height: f64) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.width = width;
            data.height = height;
        }
    }

    /// Assign a fractional bounding width that differs from the layout width.
    pub fn set_bounding_width(&mut self, node: NodeId, width: f64) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.bounding_width = Some(width);
        }
    }

    /// Replace the reported input capabilities.
    pub fn set_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities = capabilities;
    }

    /// Set whether a media query matches.
    pub fn set_media_matches(&mut self, query: impl Into<String>, matches: bool) {
        self.media.insert(query.into(), matches);
    }

    /// Set the reported connectivity.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    /// Number of pending timers.
    pub fn pending_timer_count(&self) -> usize {
        self.timers.pending_count()
    }

    /// Every listener registration, in registration order.
    pub fn listener_entries(&self) -> &[ListenerEntry] {
        &self.listeners
    }

    /// Classes of an element, in insertion order.
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes
            .get(node)
            .map(|data| data.classes.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|data| data.children.iter().copied())
            .filter(|child| self.nodes.get(*child).is_some_and(NodeData::is_element))
    }

    /// Element descendants of `root` (excluding it) in document order.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.element_children(root).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children: Vec<NodeId> = self.element_children(node).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node).and_then(|data| data.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.retain(|child| *child != node);
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.parent = None;
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_node(child);
        }
    }

    fn build_fragment(&mut self, parent: NodeId, fragment: Vec<HtmlNode>) {
        for item in fragment {
            match item {
                HtmlNode::Text(text) => {
                    let node = self.nodes.insert(NodeData::text(&text));
                    self.append_child(parent, node);
                }
                HtmlNode::Element {
                    tag,
                    attributes,
                    children,
                } => {
                    let node = self.create_element(&tag);
                    for (name, value) in attributes {
                        self.set_attribute(node, &name, &value);
                    }
                    self.append_child(parent, node);
                    self.build_fragment(node, children);
                }
            }
        }
    }

    fn parse_selector(&self, selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(target: targets::DOM, %err, "selector rejected");
                None
            }
        }
    }
}

impl MatchContext for MemoryDocument {
    fn element_tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|data| data.tag.as_str())
    }

    fn element_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node)
            .and_then(|data| data.attributes.get(name))
            .map(String::as_str)
    }

    fn element_has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    fn element_parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|data| data.parent)
    }
}

impl Geometry for MemoryDocument {
    fn offset_width(&self, node: NodeId) -> f64 {
        self.nodes.get(node).map_or(0.0, |data| data.width.round())
    }

    fn bounding_width(&self, node: NodeId) -> f64 {
        self.nodes
            .get(node)
            .map_or(0.0, |data| data.bounding_width.unwrap_or(data.width))
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.nodes.get(node).map_or(0.0, |data| data.height.round())
    }
}

impl FocusProvider for MemoryDocument {
    fn active_element(&self) -> Option<NodeId> {
        self.focused.or(Some(self.body))
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_focusable(node) {
            tracing::trace!(target: targets::DOM, ?node, "focus moved");
            self.focused = Some(node);
        }
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let Some(data) = self.nodes.get(node) else {
            return false;
        };
        if !data.is_element() {
            return false;
        }
        let tag = data.tag.as_str();
        let attr = |name: &str| data.attributes.get(name).map(String::as_str);

        NATIVE_FOCUSABLE.contains(&tag)
            || (tag == "a" && attr("href").is_some())
            || attr("tabindex").is_some()
            || (matches!(tag, "audio" | "video") && attr("controls").is_some())
            || attr("contenteditable").is_some_and(|value| value != "false")
    }

    fn focusable_descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.is_focusable(*node))
            .collect()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(NodeData::element(tag))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            tracing::warn!(target: targets::DOM, "refusing to append a node into its own subtree");
            return;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(focused) = self.focused {
            if self.contains(node, focused) {
                self.focused = None;
            }
        }
        self.detach(node);
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        let Some(data) = self.nodes.get(node).cloned() else {
            return self.create_element("div");
        };
        let children = data.children.clone();
        let copy = self.nodes.insert(NodeData {
            parent: None,
            children: Vec::new(),
            ..data
        });
        for child in children {
            let child_copy = self.clone_node(child);
            self.nodes[child_copy].parent = Some(copy);
            self.nodes[copy].children.push(child_copy);
        }
        copy
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element_parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element_children(node).collect()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.element_parent(n);
        }
        false
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element_tag(node).unwrap_or_default().to_owned()
    }

    fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = self.parse_selector(selector)?;
        self.descendants(root)
            .into_iter()
            .find(|node| selector.matches(*node, self))
    }

    fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = self.parse_selector(selector) else {
            return Vec::new();
        };
        self.descendants(root)
            .into_iter()
            .filter(|node| selector.matches(*node, self))
            .collect()
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) {
        self.clear_children(node);
        match parse_fragment(html) {
            Ok(fragment) => self.build_fragment(node, fragment),
            Err(err) => {
                tracing::warn!(target: targets::DOM, %err, "markup rejected, inserting as text");
                self.set_text_content(node, html);
            }
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let text_node = self.nodes.insert(NodeData::text(text));
            self.append_child(node, text_node);
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(data) = self.nodes.get(node) else {
            return String::new();
        };
        if let Some(text) = &data.text {
            return text.clone();
        }
        data.children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_owned());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element_has_class(node, class)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        if name == "class" {
            return self.nodes.get(node).map(|data| data.classes.join(" "));
        }
        self.element_attribute(node, name).map(str::to_owned)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        match name {
            "class" => {
                data.classes.clear();
                for class in value.split_whitespace() {
                    if !data.classes.iter().any(|c| c == class) {
                        data.classes.push(class.to_owned());
                    }
                }
            }
            "style" => {
                data.styles.clear();
                for declaration in value.split(';') {
                    if let Some((property, val)) = declaration.split_once(':') {
                        data.styles
                            .insert(property.trim().to_owned(), val.trim().to_owned());
                    }
                }
            }
            _ => {
                data.attributes.insert(name.to_owned(), value.to_owned());
            }
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            match name {
                "class" => data.classes.clear(),
                "style" => data.styles.clear(),
                _ => {
                    data.attributes.remove(name);
                }
            }
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes
            .get(node)
            .and_then(|data| data.styles.get(property))
            .cloned()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            if value.is_empty() {
                data.styles.remove(property);
            } else {
                data.styles.insert(property.to_owned(), value.to_owned());
            }
        }
    }

    fn add_listener(&mut self, target: NodeId, kind: EventKind, owner: ListenerOwner) {
        let entry = ListenerEntry {
            target,
            kind,
            owner,
        };
        if !self.listeners.contains(&entry) {
            tracing::trace!(target: targets::DOM, ?target, %kind, ?owner, "listener added");
            self.listeners.push(entry);
        }
    }

    fn remove_listener(&mut self, target: NodeId, kind: EventKind, owner: ListenerOwner) {
        self.listeners
            .retain(|entry| !(entry.target == target && entry.kind == kind && entry.owner == owner));
    }

    fn listeners(&self, target: NodeId, kind: EventKind) -> Vec<ListenerOwner> {
        self.listeners
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .map(|entry| entry.owner)
            .collect()
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn start_timer(&mut self, delay: Duration, owner: ListenerOwner) -> TimerId {
        let id = self.timers.start_one_shot(delay);
        self.timer_owners.insert(id, owner);
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timer_owners.remove(&id);
        // Fired or unknown timers are not an error for callers.
        let _ = self.timers.cancel(id);
    }

    fn advance_timers(&mut self, elapsed: Duration) -> Vec<(TimerId, ListenerOwner)> {
        self.timers
            .advance(elapsed)
            .into_iter()
            .filter_map(|id| self.timer_owners.remove(&id).map(|owner| (id, owner)))
            .collect()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn media_matches(&self, query: &str) -> bool {
        self.media.get(query).copied().unwrap_or(false)
    }

    fn is_online(&self) -> bool {
        self.online
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::WidgetId;

    fn setup() -> MemoryDocument {
        MemoryDocument::from_body_html(
            r#"<div id="card" class="card">
                <p>Intro <a href="/more">more</a></p>
                <a>anchor without href</a>
                <div tabindex="-1">panel</div>
                <div contenteditable="false">frozen</div>
                <div contenteditable="true">editable</div>
                <video controls="">clip</video>
                <audio>silent</audio>
                <button>Ok</button>
            </div>"#,
        )
    }

    #[test]
    fn test_focusable_predicate() {
        let doc = setup();
        let card = doc.query_selector(doc.body(), "#card").unwrap();
        let tags: Vec<String> = doc
            .focusable_descendants(card)
            .into_iter()
            .map(|node| doc.tag_name(node))
            .collect();
        assert_eq!(tags, vec!["a", "div", "div", "video", "button"]);
    }

    #[test]
    fn test_query_selector_in_document_order() {
        let doc = setup();
        let found = doc.query_selector_all(doc.body(), "button, a[href]");
        assert_eq!(found.len(), 2);
        assert_eq!(doc.tag_name(found[0]), "a");
        assert_eq!(doc.tag_name(found[1]), "button");
        assert!(doc.query_selector(doc.body(), "div p a").is_some());
        assert!(doc.query_selector(doc.body(), "[=broken]").is_none());
    }

    #[test]
    fn test_text_content_and_inner_html() {
        let mut doc = setup();
        let card = doc.query_selector(doc.body(), "#card").unwrap();
        doc.set_inner_html(card, "<span>one</span><span>two</span>");
        assert_eq!(doc.text_content(card), "onetwo");
        assert_eq!(doc.children(card).len(), 2);

        doc.set_inner_html(card, "<p>Hello <b>world</b> again</p>");
        assert_eq!(doc.text_content(card), "Hello world again");

        doc.set_text_content(card, "plain");
        assert_eq!(doc.text_content(card), "plain");
        assert!(doc.children(card).is_empty());
    }

    #[test]
    fn test_clone_is_detached_deep_copy() {
        let mut doc = setup();
        let card = doc.query_selector(doc.body(), "#card").unwrap();
        let copy = doc.clone_node(card);
        assert_eq!(doc.parent(copy), None);
        assert!(doc.has_class(copy, "card"));
        assert_eq!(doc.focusable_descendants(copy).len(), 5);
        assert!(!doc.contains(doc.body(), copy));
    }

    #[test]
    fn test_removing_focused_subtree_resets_focus() {
        let mut doc = setup();
        let card = doc.query_selector(doc.body(), "#card").unwrap();
        let button = doc.query_selector(card, "button").unwrap();
        doc.focus(button);
        assert_eq!(doc.active_element(), Some(button));

        doc.remove_node(card);
        assert_eq!(doc.active_element(), Some(doc.body()));
    }

    #[test]
    fn test_focus_ignores_unfocusable_elements() {
        let mut doc = setup();
        let paragraph = doc.query_selector(doc.body(), "p").unwrap();
        doc.focus(paragraph);
        assert_eq!(doc.active_element(), Some(doc.body()));
    }

    #[test]
    fn test_listener_bookkeeping() {
        let mut doc = setup();
        let body = doc.body();
        let owner = ListenerOwner::Dropdown(WidgetId::new());
        doc.add_listener(body, EventKind::Click, owner);
        doc.add_listener(body, EventKind::Click, owner);
        assert_eq!(doc.listener_count(), 1);
        assert_eq!(doc.listeners(body, EventKind::Click), vec![owner]);

        doc.remove_listener(body, EventKind::Click, owner);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_timers_report_owner() {
        let mut doc = setup();
        let first = doc.start_timer(Duration::from_millis(100), ListenerOwner::Announcer);
        let second = doc.start_timer(Duration::from_millis(50), ListenerOwner::App);
        doc.cancel_timer(second);

        assert!(doc.advance_timers(Duration::from_millis(99)).is_empty());
        assert_eq!(
            doc.advance_timers(Duration::from_millis(1)),
            vec![(first, ListenerOwner::Announcer)]
        );
        assert_eq!(doc.pending_timer_count(), 0);
    }

    #[test]
    fn test_class_attribute_round_trip() {
        let mut doc = setup();
        let body = doc.body();
        doc.set_attribute(body, "class", "no-js no-touch");
        doc.remove_class(body, "no-js");
        assert_eq!(doc.attribute(body, "class").as_deref(), Some("no-touch"));
    }
}
