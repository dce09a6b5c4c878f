//! Application layer over the library database.
//!
//! Resolves settings, opens the [`Library`] and re-exports the data model and
//! store types frontends need, so they depend on this crate alone.

pub mod context;
pub mod error;
pub mod settings;

pub use context::Library;
pub use error::LibraryError;
pub use settings::{DatabaseSettings, PagingSettings, Settings, default_db_path, settings_path};

pub use reelvault_catalog::*;
pub use reelvault_db::{
    BuildError, CommandOutcome, Condition, CutoffDecisionEngine, Database, LogFields, ModelAction,
    ModelEvent, MovieFields, OperationError, PagingSpec, RETENTION_HOURS, SchemaError,
    SortDirection, monitored_filter,
};
