//! Listener ownership.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{EventKind, NodeId};
use crate::widget::DragChannel;

/// Unique identifier of a widget instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    /// Allocate a fresh id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who should handle an event or a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerOwner {
    /// A slider instance (triggers, viewport, list).
    Slider(WidgetId),
    /// Document-level drag move/end listeners shared by all sliders.
    SliderDrag(DragChannel),
    /// A dropdown instance (trigger, element, close button).
    Dropdown(WidgetId),
    /// Page-level dropdown dismissal (outside click, Escape).
    DropdownPage,
    /// A modal trigger.
    ModalTrigger(WidgetId),
    /// The modal layer (wrapper, backdrop, close button, content).
    ModalLayer,
    /// A hover animation instance.
    HoverAnimation(WidgetId),
    /// The assistive announcer.
    Announcer,
    /// The application bootstrap itself.
    App,
}

/// A single listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerEntry {
    /// Element the listener is attached to.
    pub target: NodeId,
    /// Event type.
    pub kind: EventKind,
    /// Handler.
    pub owner: ListenerOwner,
}
