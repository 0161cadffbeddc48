//! Error types for harden-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from harden-core
    #[error(transparent)]
    Core(#[from] harden_core::Error),

    /// JSON output could not be produced
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    /// Profile could not be rendered as TOML
    #[error("TOML output error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Logging could not be set up
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
