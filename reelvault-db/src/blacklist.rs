//! Releases that must not be grabbed again.

use std::ops::Deref;
use std::sync::Arc;

use reelvault_catalog::{Blacklist, Movie};
use rusqlite::Rows;

use crate::builder::SqlBuilder;
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::mapping::{Entity, select_list};
use crate::repository::{BasicRepository, Projection};
use crate::tables::BlacklistFields;

const MOVIE_ON: &str = r#""movies"."id" = "blacklist"."movie_id""#;

/// Blacklist rows with their movie.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlacklistProjection;

impl Projection<Blacklist> for BlacklistProjection {
    fn builder(&self) -> SqlBuilder {
        SqlBuilder::new::<Blacklist>().join::<Movie>(MOVIE_ON)
    }

    fn columns(&self) -> String {
        format!("{}, {}", select_list::<Blacklist>(), select_list::<Movie>())
    }

    fn read(&self, rows: &mut Rows<'_>) -> rusqlite::Result<Vec<Blacklist>> {
        let movie_at = Blacklist::COLUMNS.len();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut entry = Blacklist::from_row(row, 0)?;
            entry.movie = Some(Box::new(Movie::from_row(row, movie_at)?));
            out.push(entry);
        }
        Ok(out)
    }
}

#[derive(Clone)]
pub struct BlacklistRepository {
    repo: BasicRepository<Blacklist>,
}

impl Deref for BlacklistRepository {
    type Target = BasicRepository<Blacklist>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl BlacklistRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db)
                .with_events(events)
                .with_paged_projection(BlacklistProjection),
        }
    }

    /// Entries for a movie whose source title contains `source_title`.
    pub fn blacklisted_by_title(
        &self,
        movie_id: i64,
        source_title: &str,
    ) -> Result<Vec<Blacklist>, OperationError> {
        let builder = self
            .builder()
            .equal(BlacklistFields::MOVIE_ID, movie_id)?
            .contains(BlacklistFields::SOURCE_TITLE, source_title)?;
        self.query(builder)
    }

    pub fn blacklisted_by_torrent_info_hash(
        &self,
        movie_id: i64,
        torrent_info_hash: &str,
    ) -> Result<Vec<Blacklist>, OperationError> {
        let builder = self
            .builder()
            .equal(BlacklistFields::MOVIE_ID, movie_id)?
            .contains(BlacklistFields::TORRENT_INFO_HASH, torrent_info_hash)?;
        self.query(builder)
    }

    pub fn blacklisted_by_movie(&self, movie_id: i64) -> Result<Vec<Blacklist>, OperationError> {
        self.query(self.builder().equal(BlacklistFields::MOVIE_ID, movie_id)?)
    }

    pub fn delete_for_movie(&self, movie_id: i64) -> Result<usize, OperationError> {
        self.delete_where(self.builder().equal(BlacklistFields::MOVIE_ID, movie_id)?)
    }
}
