//! Drag gesture input shared by every slider.
//!
//! Touch, pointer and mouse events are normalized into one [`DragInput`]
//! stream per [`DragChannel`]. Pointer events only count when produced by a
//! touch screen or a pen; mouse pointers are left to the mouse channel.
//!
//! The [`DragRegistry`] owns what the sliders share:
//!
//! - the document-level move/end listeners of each channel, installed by the
//!   first registrant and removed by the last
//! - the single active drag session, so that two sliders never drag at once

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_core::logging::targets;

use crate::dom::{Document, DomEvent, EventKind, ListenerOwner, NodeId, Point, WidgetId};

/// The device family a drag session is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragChannel {
    Touch,
    Pointer,
    Mouse,
}

impl DragChannel {
    const ALL: [DragChannel; 3] = [Self::Touch, Self::Pointer, Self::Mouse];

    fn index(self) -> usize {
        match self {
            Self::Touch => 0,
            Self::Pointer => 1,
            Self::Mouse => 2,
        }
    }

    /// Event that starts a drag on a viewport.
    pub fn start_kind(self) -> EventKind {
        match self {
            Self::Touch => EventKind::TouchStart,
            Self::Pointer => EventKind::PointerDown,
            Self::Mouse => EventKind::MouseDown,
        }
    }

    /// Document-level event that moves the drag.
    pub fn move_kind(self) -> EventKind {
        match self {
            Self::Touch => EventKind::TouchMove,
            Self::Pointer => EventKind::PointerMove,
            Self::Mouse => EventKind::MouseMove,
        }
    }

    /// Document-level event that ends the drag.
    pub fn end_kind(self) -> EventKind {
        match self {
            Self::Touch => EventKind::TouchEnd,
            Self::Pointer => EventKind::PointerUp,
            Self::Mouse => EventKind::MouseUp,
        }
    }
}

/// One step of a normalized drag stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragInput {
    Start {
        channel: DragChannel,
        target: NodeId,
        point: Point,
    },
    Move {
        channel: DragChannel,
        point: Point,
    },
    End {
        channel: DragChannel,
    },
}

impl DragInput {
    /// Normalize a host event. Returns `None` for events that are not part
    /// of a drag, including mouse-typed pointer events.
    pub fn from_event(event: &DomEvent) -> Option<Self> {
        use DragChannel::*;
        let input = match *event {
            DomEvent::TouchStart { target, point } => Self::Start { channel: Touch, target, point },
            DomEvent::TouchMove { point, .. } => Self::Move { channel: Touch, point },
            DomEvent::TouchEnd { .. } => Self::End { channel: Touch },
            DomEvent::PointerDown { target, point, pointer_type } if pointer_type.is_touch_like() => {
                Self::Start { channel: Pointer, target, point }
            }
            DomEvent::PointerMove { point, pointer_type, .. } if pointer_type.is_touch_like() => {
                Self::Move { channel: Pointer, point }
            }
            DomEvent::PointerUp { pointer_type, .. } if pointer_type.is_touch_like() => {
                Self::End { channel: Pointer }
            }
            DomEvent::MouseDown { target, point } => Self::Start { channel: Mouse, target, point },
            DomEvent::MouseMove { point, .. } => Self::Move { channel: Mouse, point },
            DomEvent::MouseUp { .. } => Self::End { channel: Mouse },
            _ => return None,
        };
        Some(input)
    }

    /// The channel this input belongs to.
    pub fn channel(&self) -> DragChannel {
        match self {
            Self::Start { channel, .. } | Self::Move { channel, .. } | Self::End { channel } => *channel,
        }
    }
}

/// Direction lock decided on the first move of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchDirection {
    Horizontal,
    Vertical,
}

impl TouchDirection {
    /// Horizontal when the horizontal travel is more than half the vertical.
    pub fn detect(start: Point, current: Point) -> Self {
        if (start.x - current.x).abs() * 2.0 > (start.y - current.y).abs() {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

/// The active drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Slider that owns the session.
    pub owner: WidgetId,
    /// Channel the session was started on.
    pub channel: DragChannel,
}

/// Shared drag bookkeeping for all sliders of a document.
#[derive(Debug, Default)]
pub struct DragRegistry {
    counts: [usize; 3],
    active: Option<DragSession>,
}

/// A drag registry shared between sliders.
pub type SharedDragRegistry = Arc<Mutex<DragRegistry>>;

impl DragRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry ready to be shared.
    pub fn shared() -> SharedDragRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Count a slider in for `channel`, installing the document-level
    /// listeners when it is the first.
    pub fn register(&mut self, doc: &mut dyn Document, channel: DragChannel) {
        let count = &mut self.counts[channel.index()];
        if *count == 0 {
            let root = doc.root();
            doc.add_listener(root, channel.move_kind(), ListenerOwner::SliderDrag(channel));
            doc.add_listener(root, channel.end_kind(), ListenerOwner::SliderDrag(channel));
            tracing::debug!(target: targets::SLIDER, ?channel, "document drag listeners installed");
        }
        *count += 1;
    }

    /// Count a slider out of `channel`, removing the document-level
    /// listeners when it was the last.
    pub fn unregister(&mut self, doc: &mut dyn Document, channel: DragChannel) {
        let count = &mut self.counts[channel.index()];
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            let root = doc.root();
            doc.remove_listener(root, channel.move_kind(), ListenerOwner::SliderDrag(channel));
            doc.remove_listener(root, channel.end_kind(), ListenerOwner::SliderDrag(channel));
            tracing::debug!(target: targets::SLIDER, ?channel, "document drag listeners removed");
        }
    }

    /// Number of sliders registered for `channel`.
    pub fn registrant_count(&self, channel: DragChannel) -> usize {
        self.counts[channel.index()]
    }

    /// Total registrations across all channels.
    pub fn total_registrants(&self) -> usize {
        DragChannel::ALL.iter().map(|c| self.registrant_count(*c)).sum()
    }

    /// The active session, if any.
    pub fn active(&self) -> Option<DragSession> {
        self.active
    }

    /// Claim the session lock. Fails when any session is active.
    pub fn try_begin(&mut self, owner: WidgetId, channel: DragChannel) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(DragSession { owner, channel });
        true
    }

    /// Release the lock when `channel` matches the active session.
    pub fn end(&mut self, channel: DragChannel) -> Option<DragSession> {
        match self.active {
            Some(session) if session.channel == channel => self.active.take(),
            _ => None,
        }
    }

    /// Release the lock when it is held by `owner`.
    pub fn release(&mut self, owner: WidgetId) -> bool {
        match self.active {
            Some(session) if session.owner == owner => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}

static_assertions::assert_impl_all!(DragRegistry: Send, Sync);
