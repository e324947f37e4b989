//! Host document abstraction.
//!
//! The widget engines never talk to a browser directly. Everything they need
//! from the page is expressed by the [`Document`] trait, which is composed of
//! the two collaborators the engines lean on hardest:
//!
//! - [`Geometry`]: measured widths and heights of elements
//! - [`FocusProvider`]: the focused element, moving focus, and the fixed
//!   "is this element focusable" predicate
//!
//! plus tree queries, class/attribute/style mutation, listener bookkeeping,
//! timers and capability detection.
//!
//! [`MemoryDocument`] is a complete in-memory implementation used by the test
//! suites and by the demo program. A browser binding implements the same
//! trait over the real DOM.
//!
//! # Listener Model
//!
//! Listeners are bookkeeping entries `(target, kind, owner)`. The document
//! does not call back into engines; the application bootstrap looks up the
//! owners along an event's bubbling path and routes the event to them.

mod events;
mod html;
mod listener;
mod memory;
mod selector;

use std::time::Duration;

use slotmap::new_key_type;
use tessera_core::TimerId;

pub use events::{DomEvent, EventFlow, EventKind, Key, PointerType};
pub use listener::{ListenerEntry, ListenerOwner, WidgetId};
pub use memory::MemoryDocument;
pub use selector::{AttributeSelector, MatchContext, Selector, SelectorError, SelectorPart};

new_key_type! {
    /// A stable handle to an element of a host document.
    pub struct NodeId;
}

/// A position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal page coordinate.
    pub x: f64,
    /// Vertical page coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input capabilities reported by the host.
///
/// Slider drag registration picks touch events when available, pointer
/// events otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The host emits `touchstart`/`touchmove`/`touchend`.
    pub touch_events: bool,
    /// The host emits `pointerdown`/`pointermove`/`pointerup`.
    pub pointer_events: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            touch_events: false,
            pointer_events: true,
        }
    }
}

/// Element measurements.
pub trait Geometry {
    /// Layout width of an element, in whole pixels.
    fn offset_width(&self, node: NodeId) -> f64;

    /// Width of an element's bounding box, possibly fractional.
    fn bounding_width(&self, node: NodeId) -> f64;

    /// Layout height of an element, in whole pixels.
    fn offset_height(&self, node: NodeId) -> f64;
}

/// Focus access.
pub trait FocusProvider {
    /// The element that currently has focus.
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus to `node`. Elements that cannot take focus are ignored.
    fn focus(&mut self, node: NodeId);

    /// Whether `node` matches the focusable capability predicate: native
    /// interactive elements, links with a target, elements with an explicit
    /// focus index, media with controls and editable content.
    fn is_focusable(&self, node: NodeId) -> bool;

    /// Focusable descendants of `root` (excluding `root`) in document order.
    fn focusable_descendants(&self, root: NodeId) -> Vec<NodeId>;
}

/// The host document driven by the widget engines.
pub trait Document: Geometry + FocusProvider {
    // =========================================================================
    // Tree
    // =========================================================================

    /// The document root; document-level listeners are registered here.
    fn root(&self) -> NodeId;

    /// The `body` element.
    fn body(&self) -> NodeId;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Append `child` to `parent`, detaching it from its previous parent.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach `node` from its parent.
    fn remove_node(&mut self, node: NodeId);

    /// Deep-copy `node` and its subtree. The copy is detached.
    fn clone_node(&mut self, node: NodeId) -> NodeId;

    /// Parent of `node`.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of `node` in order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Lowercase tag name of `node`.
    fn tag_name(&self, node: NodeId) -> String;

    /// First descendant of `root` matching `selector`.
    fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId>;

    /// All descendants of `root` matching `selector`, in document order.
    fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    /// Replace the children of `node` with parsed markup.
    fn set_inner_html(&mut self, node: NodeId, html: &str);

    /// Replace the children of `node` with text.
    fn set_text_content(&mut self, node: NodeId, text: &str);

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    // =========================================================================
    // Classes, attributes, styles
    // =========================================================================

    /// Add a class to `node`.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Remove a class from `node`.
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Whether `node` carries `class`.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Attribute value of `node`.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Set an attribute on `node`.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute from `node`.
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Whether `node` has the attribute `name`.
    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Inline style property of `node`.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    /// Set an inline style property. An empty value removes the property.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    // =========================================================================
    // Listeners, timers, environment
    // =========================================================================

    /// Register `owner` for `kind` events on `target`. Duplicate registrations
    /// are ignored.
    fn add_listener(&mut self, target: NodeId, kind: EventKind, owner: ListenerOwner);

    /// Remove a registration made with [`add_listener`](Self::add_listener).
    fn remove_listener(&mut self, target: NodeId, kind: EventKind, owner: ListenerOwner);

    /// Owners registered for `kind` on `target`, in registration order.
    fn listeners(&self, target: NodeId, kind: EventKind) -> Vec<ListenerOwner>;

    /// Total number of registrations held by the document.
    fn listener_count(&self) -> usize;

    /// Start a one-shot timer on behalf of `owner`.
    fn start_timer(&mut self, delay: Duration, owner: ListenerOwner) -> TimerId;

    /// Cancel a timer. Unknown or fired timers are ignored.
    fn cancel_timer(&mut self, id: TimerId);

    /// Advance the host clock and return the timers that fired, in order.
    ///
    /// Hosts whose timers are driven by an external event loop report their
    /// expirations here as they arrive.
    fn advance_timers(&mut self, elapsed: Duration) -> Vec<(TimerId, ListenerOwner)>;

    /// Input capabilities of the host.
    fn capabilities(&self) -> Capabilities;

    /// Whether the media query currently matches.
    fn media_matches(&self, query: &str) -> bool;

    /// Whether the host reports network connectivity.
    fn is_online(&self) -> bool;
}
