use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Settings could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// A flag value was not understood
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    pub(crate) fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
