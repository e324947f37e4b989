//! Dropdown panels with mutual exclusion.
//!
//! A [`Dropdown`] pairs a trigger with a collapsible element. Dropdowns live
//! in a [`DropdownSet`], which is the registry used for mutual exclusion:
//! opening one closes its non-independent peers, a click or touch that
//! reaches the page body closes every non-independent dropdown and Escape
//! closes all of them.
//!
//! The page-level listeners are installed on the body by the first
//! initialized dropdown and removed when the last one is destroyed.

use serde::Deserialize;
use tessera_core::Signal;
use tessera_core::logging::targets;

use crate::dom::{Document, DomEvent, EventFlow, EventKind, Key, ListenerOwner, NodeId, WidgetId};
use crate::error::{Error, Result};

const WIDGET: &str = "Dropdown";

/// Behavioral options of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropdownOptions {
    /// Exempt from sibling opens and outside clicks. Escape still closes it.
    pub is_independent: bool,
    /// Track the element's `max-height` while open.
    pub set_height: bool,
    pub is_opened_class: String,
    pub is_active_class: String,
}

impl Default for DropdownOptions {
    fn default() -> Self {
        Self {
            is_independent: false,
            set_height: true,
            is_opened_class: "is-opened".into(),
            is_active_class: "is-active".into(),
        }
    }
}

/// Builder for [`Dropdown`].
#[derive(Debug, Default)]
pub struct DropdownBuilder {
    element: Option<NodeId>,
    trigger: Option<NodeId>,
    close_button: Option<NodeId>,
    options: DropdownOptions,
}

impl DropdownBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, element: NodeId) -> Self {
        self.element = Some(element);
        self
    }

    pub fn trigger(mut self, trigger: NodeId) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn close_button(mut self, close_button: NodeId) -> Self {
        self.close_button = Some(close_button);
        self
    }

    pub fn options(mut self, options: DropdownOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the references and create the dropdown.
    pub fn build(self) -> Result<Dropdown> {
        let element = self.element.ok_or(Error::missing(WIDGET, "element"))?;
        let trigger = self.trigger.ok_or(Error::missing(WIDGET, "trigger"))?;
        Ok(Dropdown {
            id: WidgetId::new(),
            element,
            trigger,
            close_button: self.close_button,
            options: self.options,
            is_opened: false,
            is_initialized: false,
            initialized: Signal::new(),
            opened: Signal::new(),
            closed: Signal::new(),
            destroyed: Signal::new(),
        })
    }
}

/// A trigger and its collapsible element.
pub struct Dropdown {
    id: WidgetId,
    element: NodeId,
    trigger: NodeId,
    close_button: Option<NodeId>,
    options: DropdownOptions,
    is_opened: bool,
    is_initialized: bool,

    /// Emitted after `init`.
    pub initialized: Signal<()>,
    /// Emitted after the dropdown opens.
    pub opened: Signal<()>,
    /// Emitted after the dropdown closes.
    pub closed: Signal<()>,
    /// Emitted after `destroy`.
    pub destroyed: Signal<()>,
}

impl std::fmt::Debug for Dropdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropdown")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("trigger", &self.trigger)
            .field("is_opened", &self.is_opened)
            .field("is_initialized", &self.is_initialized)
            .finish()
    }
}

impl Dropdown {
    #[inline]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    #[inline]
    pub fn element(&self) -> NodeId {
        self.element
    }

    #[inline]
    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    #[inline]
    pub fn is_opened(&self) -> bool {
        self.is_opened
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    #[inline]
    pub fn is_independent(&self) -> bool {
        self.options.is_independent
    }

    fn owner(&self) -> ListenerOwner {
        ListenerOwner::Dropdown(self.id)
    }

    fn open(&mut self, doc: &mut dyn Document) {
        doc.add_class(self.trigger, &self.options.is_active_class);
        doc.set_attribute(self.trigger, "aria-expanded", "true");
        doc.add_class(self.element, &self.options.is_opened_class);
        doc.set_attribute(self.element, "aria-hidden", "false");
        if self.options.set_height {
            self.apply_height(doc);
        }
        self.is_opened = true;
        tracing::debug!(target: targets::DROPDOWN, id = ?self.id, "dropdown opened");
        self.opened.emit(());
    }

    fn close(&mut self, doc: &mut dyn Document) {
        doc.remove_class(self.trigger, &self.options.is_active_class);
        doc.set_attribute(self.trigger, "aria-expanded", "false");
        doc.remove_class(self.element, &self.options.is_opened_class);
        doc.set_attribute(self.element, "aria-hidden", "true");
        if self.options.set_height {
            doc.set_style(self.element, "max-height", "0px");
        }
        self.is_opened = false;
        if doc.active_element().is_some_and(|active| doc.contains(self.element, active)) {
            doc.focus(self.trigger);
        }
        tracing::debug!(target: targets::DROPDOWN, id = ?self.id, "dropdown closed");
        self.closed.emit(());
    }

    /// `max-height` is the summed height of the element's children.
    fn apply_height(&self, doc: &mut dyn Document) {
        let height: f64 = doc
            .children(self.element)
            .into_iter()
            .map(|child| doc.offset_height(child))
            .sum();
        doc.set_style(self.element, "max-height", &format!("{height}px"));
    }
}

/// The registry of dropdowns of one document.
#[derive(Debug, Default)]
pub struct DropdownSet {
    dropdowns: Vec<Dropdown>,
    /// Initialized dropdowns in initialization order.
    initialized: Vec<WidgetId>,
}

impl DropdownSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a built dropdown.
    pub fn insert(&mut self, dropdown: Dropdown) -> WidgetId {
        let id = dropdown.id;
        self.dropdowns.push(dropdown);
        id
    }

    pub fn get(&self, id: WidgetId) -> Option<&Dropdown> {
        self.dropdowns.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut Dropdown> {
        self.dropdowns.iter_mut().find(|d| d.id == id)
    }

    /// Ids of the initialized dropdowns, in initialization order.
    pub fn initialized_ids(&self) -> &[WidgetId] {
        &self.initialized
    }

    /// Number of dropdowns owned by the set.
    pub fn len(&self) -> usize {
        self.dropdowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dropdowns.is_empty()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register listeners and aria attributes and emit `initialized`.
    pub fn init(&mut self, doc: &mut dyn Document, id: WidgetId) {
        let first = self.initialized.is_empty();
        let Some(dropdown) = self.get_mut(id) else {
            return;
        };
        if dropdown.is_initialized {
            return;
        }
        if first {
            let body = doc.body();
            for kind in [EventKind::KeyDown, EventKind::Click, EventKind::TouchEnd] {
                doc.add_listener(body, kind, ListenerOwner::DropdownPage);
            }
        }
        let owner = dropdown.owner();
        if let Some(close_button) = dropdown.close_button {
            doc.add_listener(close_button, EventKind::Click, owner);
        }
        for node in [dropdown.trigger, dropdown.element] {
            doc.add_listener(node, EventKind::Click, owner);
            doc.add_listener(node, EventKind::TouchEnd, owner);
        }
        doc.set_attribute(dropdown.trigger, "aria-expanded", "false");
        doc.set_attribute(dropdown.trigger, "aria-haspopup", "true");
        doc.set_attribute(dropdown.element, "aria-hidden", "true");
        dropdown.is_initialized = true;
        tracing::debug!(target: targets::DROPDOWN, ?id, "dropdown initialized");
        dropdown.initialized.emit(());
        self.initialized.push(id);
    }

    /// Close, remove listeners and aria attributes and emit `destroyed`.
    pub fn destroy(&mut self, doc: &mut dyn Document, id: WidgetId) {
        let Some(dropdown) = self.get_mut(id) else {
            return;
        };
        if !dropdown.is_initialized {
            return;
        }
        if dropdown.is_opened {
            dropdown.close(doc);
        }
        let owner = dropdown.owner();
        if let Some(close_button) = dropdown.close_button {
            doc.remove_listener(close_button, EventKind::Click, owner);
        }
        for node in [dropdown.trigger, dropdown.element] {
            doc.remove_listener(node, EventKind::Click, owner);
            doc.remove_listener(node, EventKind::TouchEnd, owner);
        }
        doc.remove_attribute(dropdown.trigger, "aria-expanded");
        doc.remove_attribute(dropdown.trigger, "aria-haspopup");
        doc.remove_attribute(dropdown.element, "aria-hidden");
        dropdown.is_initialized = false;

        if let Some(index) = self.initialized.iter().position(|d| *d == id) {
            self.initialized.remove(index);
        }
        if self.initialized.is_empty() {
            let body = doc.body();
            for kind in [EventKind::KeyDown, EventKind::Click, EventKind::TouchEnd] {
                doc.remove_listener(body, kind, ListenerOwner::DropdownPage);
            }
        }
        tracing::debug!(target: targets::DROPDOWN, ?id, "dropdown destroyed");
        if let Some(dropdown) = self.get(id) {
            dropdown.destroyed.emit(());
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Open `id`. Redundant opens are ignored.
    pub fn open(&mut self, doc: &mut dyn Document, id: WidgetId) {
        if let Some(dropdown) = self.get_mut(id) {
            if dropdown.is_initialized && !dropdown.is_opened {
                dropdown.open(doc);
            }
        }
    }

    /// Close `id`. Redundant closes are ignored.
    pub fn close(&mut self, doc: &mut dyn Document, id: WidgetId) {
        if let Some(dropdown) = self.get_mut(id) {
            if dropdown.is_opened {
                dropdown.close(doc);
            }
        }
    }

    /// Close every open dropdown; independent ones only when
    /// `include_independent` is set.
    pub fn close_all(&mut self, doc: &mut dyn Document, include_independent: bool) {
        for dropdown in &mut self.dropdowns {
            if dropdown.is_opened && (include_independent || !dropdown.options.is_independent) {
                dropdown.close(doc);
            }
        }
    }

    /// Re-measure the element height of an open dropdown.
    pub fn recalc_height(&mut self, doc: &mut dyn Document, id: WidgetId) {
        if let Some(dropdown) = self.get(id) {
            if dropdown.is_opened && dropdown.options.set_height {
                dropdown.apply_height(doc);
            }
        }
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    /// Handle an event delivered to a listener owned by dropdown `id`.
    pub fn handle_event(&mut self, doc: &mut dyn Document, id: WidgetId, event: &DomEvent, flow: &mut EventFlow) {
        let Some(dropdown) = self.get(id) else {
            return;
        };
        let (trigger, element, close_button) = (dropdown.trigger, dropdown.element, dropdown.close_button);
        let is_opened = dropdown.is_opened;

        match *event {
            DomEvent::Click { target } => {
                if doc.contains(trigger, target) {
                    flow.prevent_default();
                    flow.stop_propagation();
                    if is_opened {
                        self.close(doc, id);
                    } else {
                        self.close_all(doc, false);
                        self.open(doc, id);
                    }
                } else if close_button.is_some_and(|button| doc.contains(button, target)) {
                    flow.prevent_default();
                    self.close(doc, id);
                } else if doc.contains(element, target) {
                    flow.stop_propagation();
                }
            }
            DomEvent::TouchEnd { target } => {
                if doc.contains(element, target) || doc.contains(trigger, target) {
                    flow.stop_propagation();
                }
            }
            _ => {}
        }
    }

    /// Handle an event delivered to the page-level listeners.
    pub fn handle_page_event(&mut self, doc: &mut dyn Document, event: &DomEvent) {
        match event {
            DomEvent::KeyDown { key: Key::Escape, .. } => self.close_all(doc, true),
            DomEvent::Click { .. } | DomEvent::TouchEnd { .. } => self.close_all(doc, false),
            _ => {}
        }
    }
}

static_assertions::assert_impl_all!(DropdownSet: Send, Sync);
