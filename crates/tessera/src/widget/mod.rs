//! Widget engines.
//!
//! Every engine follows the same shape:
//!
//! - a builder validating the required element references
//! - a serde-deserializable options struct with the default class names
//! - `init`/`destroy` pairs that register and remove exactly the listeners
//!   the engine owns
//! - `handle_*` entry points called by the application with events and
//!   timers routed to the engine's [`ListenerOwner`](crate::dom::ListenerOwner)
//! - [`Signal`](tessera_core::Signal) fields for lifecycle hooks
//!
//! Engines never call each other; the application wires them together
//! through their signals.

mod announcer;
mod dropdown;
mod focus;
mod gesture;
mod hover_animation;
pub mod modal;
mod slider;

pub use announcer::{AnnouncementSender, Announcer, DEFAULT_ANNOUNCEMENT_TIMEOUT};
pub use dropdown::{Dropdown, DropdownBuilder, DropdownOptions, DropdownSet};
pub use focus::FocusTrap;
pub use gesture::{DragChannel, DragInput, DragRegistry, DragSession, SharedDragRegistry, TouchDirection};
pub use hover_animation::{HoverAnimation, HoverAnimationBuilder};
pub use modal::{
    ContentFetcher, FetchCompletion, FetchRequest, FetchResponse, FetchTicket, LoadError, MemoryFetcher, Modal,
    ModalBuilder, ModalClasses, ModalLayer, ModalOptions, ModalParts, ModalType,
};
pub use slider::{SlideToTrigger, Slider, SliderBuilder, SliderClasses, SliderOptions, elastic_past_end, elastic_past_start};
