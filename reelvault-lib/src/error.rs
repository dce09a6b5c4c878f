use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while opening or configuring a library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The database could not be opened or migrated
    #[error("Schema error: {0}")]
    Schema(#[from] reelvault_db::SchemaError),

    /// A repository operation failed
    #[error("{0}")]
    Operation(#[from] reelvault_db::OperationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    InvalidSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize settings: {0}")]
    SerializeSettings(#[from] toml::ser::Error),
}

impl LibraryError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
