//! Repositories for movie files, alternative titles and quality profiles.

use std::ops::Deref;
use std::sync::Arc;

use reelvault_catalog::{AlternativeTitle, MovieFile, QualityProfile};

use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::repository::BasicRepository;
use crate::tables::{AlternativeTitleFields, MovieFileFields, ProfileFields};

// ── Movie Files ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MovieFileRepository {
    repo: BasicRepository<MovieFile>,
}

impl Deref for MovieFileRepository {
    type Target = BasicRepository<MovieFile>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl MovieFileRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    pub fn get_files_by_movie(&self, movie_id: i64) -> Result<Vec<MovieFile>, OperationError> {
        self.query(self.builder().equal(MovieFileFields::MOVIE_ID, movie_id)?)
    }

    /// Files that have never been probed.
    pub fn get_files_without_media_info(&self) -> Result<Vec<MovieFile>, OperationError> {
        self.query(self.builder().is_null(MovieFileFields::MEDIA_INFO)?)
    }
}

// ── Alternative Titles ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AlternativeTitleRepository {
    repo: BasicRepository<AlternativeTitle>,
}

impl Deref for AlternativeTitleRepository {
    type Target = BasicRepository<AlternativeTitle>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl AlternativeTitleRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    pub fn find_by_source_id(
        &self,
        source_id: i64,
    ) -> Result<Option<AlternativeTitle>, OperationError> {
        let builder = self
            .builder()
            .equal(AlternativeTitleFields::SOURCE_ID, source_id)?;
        Ok(self.query(builder)?.into_iter().next())
    }

    pub fn find_by_source_ids(
        &self,
        source_ids: &[i64],
    ) -> Result<Vec<AlternativeTitle>, OperationError> {
        let builder = self
            .builder()
            .in_set(AlternativeTitleFields::SOURCE_ID, source_ids.iter().copied())?;
        self.query(builder)
    }

    pub fn find_by_movie_id(&self, movie_id: i64) -> Result<Vec<AlternativeTitle>, OperationError> {
        self.query(
            self.builder()
                .equal(AlternativeTitleFields::MOVIE_ID, movie_id)?,
        )
    }
}

// ── Quality Profiles ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ProfileRepository {
    repo: BasicRepository<QualityProfile>,
}

impl Deref for ProfileRepository {
    type Target = BasicRepository<QualityProfile>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl ProfileRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<QualityProfile>, OperationError> {
        let builder = self.builder().equal(ProfileFields::NAME, name.to_string())?;
        Ok(self.query(builder)?.into_iter().next())
    }
}
