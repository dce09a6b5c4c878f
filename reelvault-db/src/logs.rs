//! Persisted application log.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use reelvault_catalog::{LogEntry, LogLevel};

use crate::builder::SqlBuilder;
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::mapping::timestamp_value;
use crate::paging::PagingSpec;
use crate::repository::BasicRepository;
use crate::tables::LogFields;

#[derive(Clone)]
pub struct LogRepository {
    repo: BasicRepository<LogEntry>,
}

impl Deref for LogRepository {
    type Target = BasicRepository<LogEntry>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl LogRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    /// One page of entries at `min_level` or above.
    ///
    /// Entries are appended in time order, so a "time" sort is served by the
    /// id.
    pub fn list_logs(
        &self,
        mut spec: PagingSpec<LogEntry>,
        min_level: Option<LogLevel>,
    ) -> Result<PagingSpec<LogEntry>, OperationError> {
        if spec.sort_key.as_deref() == Some("time") {
            spec.sort_key = Some("id".to_string());
        }
        let mut base = self.paged_builder();
        if let Some(level) = min_level {
            let names: Vec<String> = level
                .at_least()
                .iter()
                .map(|l| l.as_str().to_string())
                .collect();
            base = base.in_set(LogFields::LEVEL, names)?;
        }
        self.list_with(spec, base)
    }

    /// Delete entries older than `days` days.
    pub fn trim(&self, days: i64) -> Result<usize, OperationError> {
        self.trim_before(Utc::now() - TimeDelta::days(days))
    }

    pub fn trim_before(&self, cutoff: DateTime<Utc>) -> Result<usize, OperationError> {
        let builder =
            SqlBuilder::new::<LogEntry>().less_than(LogFields::TIME, timestamp_value(&cutoff))?;
        let removed = self.delete_where(builder)?;
        if removed > 0 {
            log::info!("Trimmed {} log entries older than {}", removed, cutoff);
        }
        Ok(removed)
    }
}
