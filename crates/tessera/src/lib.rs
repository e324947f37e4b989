//! Tessera - headless page widget engines.
//!
//! The engines implement the behavior of common page widgets against an
//! abstract host [`Document`](dom::Document):
//!
//! - **Slider**: a carousel with rewind, slide-to triggers and elastic
//!   touch, pointer and mouse dragging
//! - **Dropdown**: mutually exclusive disclosure panels with outside-click
//!   and Escape dismissal
//! - **Modal**: a singleton overlay for images, videos, embedded players,
//!   inline dialogs and ajax content, with a focus trap
//! - **Hover animation** and an assistive **announcer**
//!
//! The [`app`] module discovers the engines on a page by their data
//! attributes and routes host events, timers and fetch completions to them.
//!
//! # Example
//!
//! ```
//! use tessera::prelude::*;
//!
//! let doc = MemoryDocument::from_body_html(r#"<div data-assistive-alert></div>"#);
//! let mut app = App::new(doc, AppConfig::default());
//! app.init();
//! assert!(app.announcer().is_some());
//! ```

pub use tessera_core::*;

pub mod app;
pub mod dom;
mod error;
pub mod prelude;
pub mod widget;

pub use error::{Error, Result};
