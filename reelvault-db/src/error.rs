//! Error types for query building and store operations.

use thiserror::Error;

/// A query could not be built. Raised before any connection is taken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Field '{field}' is not mapped for table '{table}'")]
    UnmappedField {
        table: &'static str,
        field: &'static str,
    },
    #[error("Unknown sort key '{0}'")]
    UnknownSortKey(String),
    #[error("Predicate on '{table}' but the query only reads {available}")]
    TableNotInQuery {
        table: &'static str,
        available: String,
    },
    #[error("Cannot write to '{0}' through a joined query")]
    JoinedWrite(&'static str),
}

/// A repository operation failed.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid query: {0}")]
    Build(#[from] BuildError),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("Cannot insert {entity_type} with existing id {id}")]
    AlreadyPersisted { entity_type: String, id: i64 },
    #[error("Cannot update {entity_type} without an id")]
    NotPersisted { entity_type: String },
    #[error(transparent)]
    Transition(#[from] reelvault_catalog::TransitionError),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl OperationError {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}
