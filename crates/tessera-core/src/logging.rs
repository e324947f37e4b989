//! Logging facilities for Tessera.
//!
//! Tessera uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the embedding program installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tessera::slider=debug,tessera::modal=trace")
//!     .init();
//! ```
//!
//! Every engine logs under its own target so the directives above can pick
//! out a single widget family.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "tessera::signal";
    /// Timer queue target.
    pub const TIMER: &str = "tessera::timer";
    /// Host document (listeners, selectors, parsed fragments).
    pub const DOM: &str = "tessera::dom";
    /// Slider engine and drag gestures.
    pub const SLIDER: &str = "tessera::slider";
    /// Dropdown engine.
    pub const DROPDOWN: &str = "tessera::dropdown";
    /// Modal engine and content loading.
    pub const MODAL: &str = "tessera::modal";
    /// Hover animations.
    pub const HOVER: &str = "tessera::hover";
    /// Assistive announcer.
    pub const ANNOUNCER: &str = "tessera::announcer";
    /// Application bootstrap and event routing.
    pub const APP: &str = "tessera::app";
    /// Remote content fetching.
    pub const NET: &str = "tessera::net";
}

/// Span names used for tracing.
pub mod span_names {
    /// Event dispatch through the bootstrap.
    pub const DISPATCH: &str = "tessera::dispatch";
    /// Element discovery during bootstrap.
    pub const DISCOVER: &str = "tessera::discover";
}
