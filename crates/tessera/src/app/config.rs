//! Application configuration.
//!
//! Every field has a default, so an empty document is a valid
//! configuration:
//!
//! ```
//! use tessera::app::AppConfig;
//!
//! let config = AppConfig::from_toml_str(r#"
//!     announce_suffix = "shown"
//!
//!     [breakpoints]
//!     medium = "(max-width: 60em)"
//!
//!     [slider]
//!     rewind = false
//! "#).unwrap();
//!
//! assert_eq!(config.breakpoints.medium, "(max-width: 60em)");
//! assert_eq!(config.breakpoints.small, "(max-width: 47em)");
//! assert!(!config.slider.rewind);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::widget::{DEFAULT_ANNOUNCEMENT_TIMEOUT, ModalOptions, SliderOptions};

/// Media queries of the page layout breakpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Breakpoints {
    pub large: String,
    /// Toggles the offset navigation between inline and off-canvas.
    pub medium: String,
    pub small: String,
    pub xsmall: String,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            large: "(max-width: 82em)".into(),
            medium: "(max-width: 62em)".into(),
            small: "(max-width: 47em)".into(),
            xsmall: "(max-width: 32em)".into(),
        }
    }
}

impl Breakpoints {
    /// Resolve a breakpoint name (`"medium"`) or its media query to the
    /// media query.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match name {
            "large" => &self.large,
            "medium" => &self.medium,
            "small" => &self.small,
            "xsmall" => &self.xsmall,
            query => query,
        }
    }

    pub fn queries(&self) -> [&str; 4] {
        [&self.large, &self.medium, &self.small, &self.xsmall]
    }
}

/// Configuration of the page bootstrap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub breakpoints: Breakpoints,
    /// Appended to a slider trigger's `aria-label` when announcing a move.
    pub announce_suffix: String,
    /// Milliseconds before an announcement is cleared.
    pub announcement_timeout_ms: u64,
    /// Options shared by every discovered slider.
    pub slider: SliderOptions,
    /// Base options of every discovered modal. Custom classes come from
    /// the trigger's `data-modal-custom-classes`.
    pub modal: ModalOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::default(),
            announce_suffix: "displayed".into(),
            announcement_timeout_ms: DEFAULT_ANNOUNCEMENT_TIMEOUT.as_millis() as u64,
            slider: SliderOptions::default(),
            modal: ModalOptions {
                custom_close_trigger_selector: Some("[data-modal-close-trigger]".into()),
                custom_accept_trigger_selector: Some("[data-modal-accept-trigger]".into()),
                open_animation_name: Some("modal-item-close".into()),
                close_animation_name: Some("modal-wrapper-close".into()),
                ..ModalOptions::default()
            },
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn announcement_timeout(&self) -> Duration {
        Duration::from_millis(self.announcement_timeout_ms)
    }
}
