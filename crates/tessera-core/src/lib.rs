//! Core systems for Tessera.
//!
//! This crate provides the pieces every widget engine builds on:
//!
//! - **Signal/Slot System**: lifecycle hooks exposed by the engines
//! - **Timers**: a one-shot timer queue driven by the host's clock
//! - **Logging**: `tracing` targets and span names per subsystem
//!
//! # Signal Example
//!
//! ```
//! use tessera_core::Signal;
//!
//! let opened = Signal::<()>::new();
//! opened.connect(|_| println!("dropdown opened"));
//! opened.emit(());
//! ```
//!
//! # Timer Example
//!
//! ```
//! use std::time::Duration;
//! use tessera_core::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let id = timers.start_one_shot(Duration::from_millis(250));
//! assert_eq!(timers.advance(Duration::from_millis(250)), vec![id]);
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{SignalError, TimerError};
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerQueue};
