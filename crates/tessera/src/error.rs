//! Error types for widget construction and configuration.

use std::path::PathBuf;

use crate::dom::SelectorError;

/// Result type alias for widget and configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building widgets or loading configuration.
///
/// Runtime content failures inside an open modal are not errors of this
/// kind; they are reported as [`LoadError`](crate::widget::modal::LoadError).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required reference was not supplied to a builder.
    #[error("{widget} requires the '{option}' option")]
    MissingOption {
        widget: &'static str,
        option: &'static str,
    },

    /// A supplied option has an unusable value.
    #[error("{widget} option '{option}' is invalid: {message}")]
    InvalidOption {
        widget: &'static str,
        option: &'static str,
        message: String,
    },

    /// The modal type is not one of the supported values.
    #[error("Modal type '{0}' is not supported")]
    UnsupportedModalType(String),

    /// Selector parsing error.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// Configuration file syntax or schema error.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a missing option error.
    pub fn missing(widget: &'static str, option: &'static str) -> Self {
        Self::MissingOption { widget, option }
    }

    /// Create an invalid option error.
    pub fn invalid(widget: &'static str, option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            widget,
            option,
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
