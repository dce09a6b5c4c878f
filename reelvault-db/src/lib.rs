//! SQLite persistence layer for the movie library.
//!
//! Provides schema creation and migration, a connection pool, typed field
//! selectors, a parameterized query builder, paged listings, and the
//! repositories built on them, including the cutoff decision engine and the
//! background command tracker.

pub mod blacklist;
pub mod builder;
pub mod commands;
pub mod config;
pub mod cutoff;
pub mod datastore;
pub mod error;
pub mod events;
pub mod history;
pub mod logs;
pub mod mapping;
pub mod media;
pub mod movies;
pub mod paging;
pub mod repository;
pub mod schema;
pub mod tables;

pub use blacklist::{BlacklistProjection, BlacklistRepository};
pub use builder::{Condition, Operator, Param, Predicate, Query, SqlBuilder};
pub use commands::{CommandOutcome, CommandRepository, RETENTION_HOURS};
pub use config::ConfigRepository;
pub use cutoff::{
    CutoffDecisionEngine, QualitiesBelowCutoff, cutoff_unmet_condition, monitored_filter,
    qualities_below_cutoff,
};
pub use datastore::{DEFAULT_POOL_SIZE, Database, PooledConnection};
pub use error::{BuildError, OperationError};
pub use events::{EventSink, ModelAction, ModelEvent, NullSink};
pub use history::{HistoryProjection, HistoryRepository};
pub use logs::LogRepository;
pub use mapping::{ColumnRef, Entity, Field};
pub use media::{AlternativeTitleRepository, MovieFileRepository, ProfileRepository};
pub use movies::{MovieProjection, MovieRepository};
pub use paging::{PagingSpec, SortDirection, Window};
pub use repository::{BasicRepository, FlatProjection, Projection};
pub use schema::SchemaError;
pub use tables::{
    AlternativeTitleFields, BlacklistFields, CommandFields, ConfigFields, HistoryFields,
    LogFields, MovieFields, MovieFileFields, ProfileFields,
};
