//! Grab and import history.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reelvault_catalog::{History, HistoryEventType, Movie, QualityModel, QualityProfile};
use rusqlite::Rows;

use crate::builder::SqlBuilder;
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::mapping::{Entity, quality_value, select_list, timestamp_value};
use crate::paging::SortDirection;
use crate::repository::{BasicRepository, Projection};
use crate::tables::HistoryFields;

const MOVIE_ON: &str = r#""movies"."id" = "history"."movie_id""#;
const PROFILE_ON: &str = r#""profiles"."id" = "movies"."profile_id""#;

/// History rows with their movie and the movie's profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryProjection;

impl Projection<History> for HistoryProjection {
    fn builder(&self) -> SqlBuilder {
        SqlBuilder::new::<History>()
            .join::<Movie>(MOVIE_ON)
            .join::<QualityProfile>(PROFILE_ON)
    }

    fn columns(&self) -> String {
        [
            select_list::<History>(),
            select_list::<Movie>(),
            select_list::<QualityProfile>(),
        ]
        .join(", ")
    }

    fn read(&self, rows: &mut Rows<'_>) -> rusqlite::Result<Vec<History>> {
        let movie_at = History::COLUMNS.len();
        let profile_at = movie_at + Movie::COLUMNS.len();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut history = History::from_row(row, 0)?;
            let mut movie = Movie::from_row(row, movie_at)?;
            movie.profile = Some(QualityProfile::from_row(row, profile_at)?);
            history.movie = Some(Box::new(movie));
            out.push(history);
        }
        Ok(out)
    }
}

#[derive(Clone)]
pub struct HistoryRepository {
    repo: BasicRepository<History>,
}

impl Deref for HistoryRepository {
    type Target = BasicRepository<History>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl HistoryRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db)
                .with_events(events)
                .with_paged_projection(HistoryProjection),
        }
    }

    /// Every quality ever recorded for a movie.
    pub fn qualities_for_movie(&self, movie_id: i64) -> Result<Vec<QualityModel>, OperationError> {
        let builder = self.builder().equal(HistoryFields::MOVIE_ID, movie_id)?;
        Ok(self
            .query(builder)?
            .into_iter()
            .filter_map(|h| h.quality)
            .collect())
    }

    pub fn most_recent_for_download_id(
        &self,
        download_id: &str,
    ) -> Result<Option<History>, OperationError> {
        let builder = self
            .builder()
            .equal(HistoryFields::DOWNLOAD_ID, download_id.to_string())?;
        self.newest(builder)
    }

    pub fn find_by_download_id(&self, download_id: &str) -> Result<Vec<History>, OperationError> {
        let builder = self
            .builder()
            .equal(HistoryFields::DOWNLOAD_ID, download_id.to_string())?;
        self.query(builder)
    }

    /// Grab, import and failure records of one movie at one exact quality.
    pub fn find_download_history(
        &self,
        movie_id: i64,
        quality: &QualityModel,
    ) -> Result<Vec<History>, OperationError> {
        let events = [
            HistoryEventType::Grabbed,
            HistoryEventType::DownloadFailed,
            HistoryEventType::DownloadFolderImported,
        ];
        let builder = self
            .builder()
            .equal(HistoryFields::MOVIE_ID, movie_id)?
            .equal(HistoryFields::QUALITY, quality_value(Some(quality))?)?
            .in_set(HistoryFields::EVENT_TYPE, events.map(HistoryEventType::code))?;
        self.query(builder)
    }

    /// A movie's history, newest first, optionally of one event type.
    pub fn get_by_movie_id(
        &self,
        movie_id: i64,
        event_type: Option<HistoryEventType>,
    ) -> Result<Vec<History>, OperationError> {
        let mut builder = self.builder().equal(HistoryFields::MOVIE_ID, movie_id)?;
        if let Some(event_type) = event_type {
            builder = builder.equal(HistoryFields::EVENT_TYPE, event_type.code())?;
        }
        self.query_sorted(builder, HistoryFields::DATE, SortDirection::Descending, None)
    }

    pub fn delete_for_movie(&self, movie_id: i64) -> Result<usize, OperationError> {
        self.delete_where(self.builder().equal(HistoryFields::MOVIE_ID, movie_id)?)
    }

    pub fn most_recent_for_movie(&self, movie_id: i64) -> Result<Option<History>, OperationError> {
        self.newest(self.builder().equal(HistoryFields::MOVIE_ID, movie_id)?)
    }

    /// Records on or after `date`, oldest first.
    pub fn since(
        &self,
        date: DateTime<Utc>,
        event_type: Option<HistoryEventType>,
    ) -> Result<Vec<History>, OperationError> {
        let mut builder = self
            .builder()
            .greater_or_equal(HistoryFields::DATE, timestamp_value(&date))?;
        if let Some(event_type) = event_type {
            builder = builder.equal(HistoryFields::EVENT_TYPE, event_type.code())?;
        }
        self.query_sorted(builder, HistoryFields::DATE, SortDirection::Ascending, None)
    }

    fn newest(&self, builder: SqlBuilder) -> Result<Option<History>, OperationError> {
        Ok(self
            .query_sorted(builder, HistoryFields::DATE, SortDirection::Descending, Some(1))?
            .into_iter()
            .next())
    }
}
