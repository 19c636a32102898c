//! Configuration error types.

/// Errors from malformed or missing configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required value was not supplied
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A value was supplied but could not be interpreted
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    /// The options file could not be read or parsed
    #[error("options error: {message}")]
    Options { message: String },
}
