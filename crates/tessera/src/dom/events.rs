//! Host events delivered to the widget engines.

use std::fmt;

use super::{NodeId, Point};

/// Event type names, used as listener keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    TouchStart,
    TouchMove,
    TouchEnd,
    PointerDown,
    PointerMove,
    PointerUp,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseEnter,
    KeyDown,
    TransitionEnd,
    AnimationEnd,
    Load,
    LoadedMetadata,
    Error,
}

impl EventKind {
    /// The host's name for this event type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
            Self::MouseEnter => "mouseenter",
            Self::KeyDown => "keydown",
            Self::TransitionEnd => "transitionend",
            Self::AnimationEnd => "animationend",
            Self::Load => "load",
            Self::LoadedMetadata => "loadedmetadata",
            Self::Error => "error",
        }
    }

    /// Whether events of this kind bubble to ancestors.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::MouseEnter | Self::Load | Self::LoadedMetadata | Self::Error
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

impl PointerType {
    /// Touch and pen pointers drive drag gestures; mouse pointers do not.
    pub fn is_touch_like(self) -> bool {
        matches!(self, Self::Touch | Self::Pen)
    }
}

/// Keys the engines react to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    /// Any other key, by its host name.
    Other(String),
}

/// An event raised by the host document.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Click {
        target: NodeId,
    },
    TouchStart {
        target: NodeId,
        point: Point,
    },
    TouchMove {
        target: NodeId,
        point: Point,
    },
    TouchEnd {
        target: NodeId,
    },
    PointerDown {
        target: NodeId,
        point: Point,
        pointer_type: PointerType,
    },
    PointerMove {
        target: NodeId,
        point: Point,
        pointer_type: PointerType,
    },
    PointerUp {
        target: NodeId,
        pointer_type: PointerType,
    },
    MouseDown {
        target: NodeId,
        point: Point,
    },
    MouseMove {
        target: NodeId,
        point: Point,
    },
    MouseUp {
        target: NodeId,
    },
    MouseEnter {
        target: NodeId,
    },
    KeyDown {
        target: NodeId,
        key: Key,
        shift: bool,
    },
    TransitionEnd {
        target: NodeId,
    },
    AnimationEnd {
        target: NodeId,
        animation_name: String,
    },
    /// Media finished loading (`img`).
    Load {
        target: NodeId,
    },
    /// Media metadata is available (`video`).
    LoadedMetadata {
        target: NodeId,
    },
    /// Media failed to load.
    Error {
        target: NodeId,
    },
}

impl DomEvent {
    /// The listener key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::TouchStart { .. } => EventKind::TouchStart,
            Self::TouchMove { .. } => EventKind::TouchMove,
            Self::TouchEnd { .. } => EventKind::TouchEnd,
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::MouseDown { .. } => EventKind::MouseDown,
            Self::MouseMove { .. } => EventKind::MouseMove,
            Self::MouseUp { .. } => EventKind::MouseUp,
            Self::MouseEnter { .. } => EventKind::MouseEnter,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::TransitionEnd { .. } => EventKind::TransitionEnd,
            Self::AnimationEnd { .. } => EventKind::AnimationEnd,
            Self::Load { .. } => EventKind::Load,
            Self::LoadedMetadata { .. } => EventKind::LoadedMetadata,
            Self::Error { .. } => EventKind::Error,
        }
    }

    /// The element the event was raised on.
    pub fn target(&self) -> NodeId {
        match self {
            Self::Click { target }
            | Self::TouchStart { target, .. }
            | Self::TouchMove { target, .. }
            | Self::TouchEnd { target }
            | Self::PointerDown { target, .. }
            | Self::PointerMove { target, .. }
            | Self::PointerUp { target, .. }
            | Self::MouseDown { target, .. }
            | Self::MouseMove { target, .. }
            | Self::MouseUp { target }
            | Self::MouseEnter { target }
            | Self::KeyDown { target, .. }
            | Self::TransitionEnd { target }
            | Self::AnimationEnd { target, .. }
            | Self::Load { target }
            | Self::LoadedMetadata { target }
            | Self::Error { target } => *target,
        }
    }

    /// Page position carried by the event, if any.
    pub fn point(&self) -> Option<Point> {
        match self {
            Self::TouchStart { point, .. }
            | Self::TouchMove { point, .. }
            | Self::PointerDown { point, .. }
            | Self::PointerMove { point, .. }
            | Self::MouseDown { point, .. }
            | Self::MouseMove { point, .. } => Some(*point),
            _ => None,
        }
    }
}

/// What handlers asked the host to do after an event was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlow {
    /// The host's default action must be suppressed.
    pub default_prevented: bool,
    /// The event must not reach further ancestors.
    pub propagation_stopped: bool,
}

impl EventFlow {
    /// Suppress the default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop bubbling after the current element.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Combine the requests of two handlers.
    pub fn merge(&mut self, other: EventFlow) {
        self.default_prevented |= other.default_prevented;
        self.propagation_stopped |= other.propagation_stopped;
    }
}
