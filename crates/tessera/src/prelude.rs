//! Prelude module for Tessera.
//!
//! ```ignore
//! use tessera::prelude::*;
//! ```
//!
//! This provides access to:
//! - The page bootstrap (`App`, `AppConfig`)
//! - The host document (`Document`, `MemoryDocument`, `DomEvent`)
//! - The widget engines and their builders
//! - Signals

// ============================================================================
// Bootstrap
// ============================================================================

pub use crate::app::{App, AppConfig, Breakpoints};

// ============================================================================
// Host Document
// ============================================================================

pub use crate::dom::{Document, DomEvent, EventFlow, EventKind, Key, MemoryDocument, NodeId, Point, PointerType};

// ============================================================================
// Widgets
// ============================================================================

pub use crate::widget::{
    Announcer, ContentFetcher, DragRegistry, Dropdown, DropdownBuilder, DropdownOptions, DropdownSet,
    HoverAnimation, HoverAnimationBuilder, MemoryFetcher, Modal, ModalBuilder, ModalLayer, ModalOptions, ModalType,
    Slider, SliderBuilder, SliderOptions,
};

// ============================================================================
// Signals and Errors
// ============================================================================

pub use crate::{Error, Result};
pub use tessera_core::Signal;
