//! Error types for function-helpers.

use thiserror::Error;

/// Primary error type for all helper operations.
///
/// Errors raised by a wrapped function are never converted into this type:
/// they travel in the wrapped function's own return value.
#[derive(Error, Debug)]
pub enum HelperError {
    #[error("No Tokio runtime available to schedule deferred executions")]
    NoRuntime,

    #[error("Once body panicked on its first execution and will not run again")]
    OncePoisoned,

    #[error("Once body is still running its first execution")]
    OnceInProgress,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Registry entry '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Nothing installed under '{0}'")]
    NotInstalled(String),
}

impl HelperError {
    /// Whether this error comes from loading or validating configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Io(_) | Self::Toml(_))
    }

    /// Whether this error describes a `Once` that ran but holds no result.
    pub fn is_once_state(&self) -> bool {
        matches!(self, Self::OncePoisoned | Self::OnceInProgress)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HelperError>;
