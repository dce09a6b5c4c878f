//! Movie library data model types, quality blobs, and command state.
//!
//! This crate defines the persistent data model for the media library without
//! any database dependencies. Consumers can use these types directly for
//! serialization, display, or passing to `reelvault-db` for persistence.

pub mod command;
pub mod quality;
pub mod title;
pub mod types;

pub use command::{CommandModel, CommandPriority, CommandStatus, CommandTrigger, TransitionError};
pub use quality::{
    QUALITY_BLOB_VERSION, Quality, QualityModel, QualityParseError, Revision, blob_has_quality,
    quality_fragment,
};
pub use title::{clean_title, normalize_imdb_id};
pub use types::*;
