//! Movie repository.
//!
//! Movies are read joined to their quality profile, every alternative title
//! and their current file. The title join is one-to-many, so rows are folded
//! back into one [`Movie`] per id.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reelvault_catalog::{
    AlternativeTitle, Movie, MovieFile, QualityProfile, clean_title, normalize_imdb_id,
};
use rusqlite::Rows;

use crate::builder::{Condition, SqlBuilder};
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::mapping::{Entity, from_row_opt, select_list, timestamp_value};
use crate::paging::PagingSpec;
use crate::repository::{BasicRepository, Projection, reduce_rows};
use crate::tables::{AlternativeTitleFields, MovieFields};

const PROFILE_ON: &str = r#""profiles"."id" = "movies"."profile_id""#;
const TITLES_ON: &str = r#""alternative_titles"."movie_id" = "movies"."id""#;
const FILE_ON: &str = r#""movie_files"."id" = "movies"."movie_file_id""#;

/// Movies with profile, alternative titles and file.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovieProjection;

impl Projection<Movie> for MovieProjection {
    fn builder(&self) -> SqlBuilder {
        SqlBuilder::new::<Movie>()
            .join::<QualityProfile>(PROFILE_ON)
            .left_join::<AlternativeTitle>(TITLES_ON)
            .left_join::<MovieFile>(FILE_ON)
    }

    fn columns(&self) -> String {
        [
            select_list::<Movie>(),
            select_list::<QualityProfile>(),
            select_list::<AlternativeTitle>(),
            select_list::<MovieFile>(),
        ]
        .join(", ")
    }

    fn read(&self, rows: &mut Rows<'_>) -> rusqlite::Result<Vec<Movie>> {
        let profile_at = Movie::COLUMNS.len();
        let title_at = profile_at + QualityProfile::COLUMNS.len();
        let file_at = title_at + AlternativeTitle::COLUMNS.len();

        reduce_rows(rows, |movie: &mut Movie, row| {
            if movie.profile.is_none() {
                movie.profile = Some(QualityProfile::from_row(row, profile_at)?);
            }
            if let Some(title) = from_row_opt::<AlternativeTitle>(row, title_at)? {
                if !movie.alternative_titles.iter().any(|t| t.id == title.id) {
                    movie.alternative_titles.push(title);
                }
            }
            if movie.movie_file.is_none() {
                movie.movie_file = from_row_opt::<MovieFile>(row, file_at)?;
            }
            Ok(())
        })
    }
}

#[derive(Clone)]
pub struct MovieRepository {
    repo: BasicRepository<Movie>,
}

impl Deref for MovieRepository {
    type Target = BasicRepository<Movie>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl MovieRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db)
                .with_events(events)
                .with_projection(MovieProjection),
        }
    }

    /// Movies whose clean title or any alternative clean title matches one
    /// of `titles`.
    pub fn find_by_titles(&self, titles: &[&str]) -> Result<Vec<Movie>, OperationError> {
        let clean: Vec<String> = titles.iter().map(|t| clean_title(t)).collect();
        let builder = self
            .builder()
            .or_in_set(MovieFields::CLEAN_TITLE, clean.clone())?
            .or_in_set(AlternativeTitleFields::CLEAN_TITLE, clean)?;
        self.query(builder)
    }

    /// Movies whose clean title, or an alternative one, appears somewhere
    /// inside `release_title` once that is cleaned.
    pub fn find_by_title_inexact(&self, release_title: &str) -> Result<Vec<Movie>, OperationError> {
        let clean = clean_title(release_title);
        let builder = self
            .builder()
            .or_where(Condition::substring_of(MovieFields::CLEAN_TITLE, clean.clone())?)?
            .or_where(Condition::substring_of(
                AlternativeTitleFields::CLEAN_TITLE,
                clean,
            )?)?;
        self.query(builder)
    }

    /// Look up by IMDb id in any common spelling (`tt0078748`, `78748`).
    pub fn find_by_imdb_id(&self, imdb_id: &str) -> Result<Option<Movie>, OperationError> {
        let Some(normalized) = normalize_imdb_id(imdb_id) else {
            return Ok(None);
        };
        self.first(self.builder().equal(MovieFields::IMDB_ID, normalized)?)
    }

    pub fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<Movie>, OperationError> {
        self.first(self.builder().equal(MovieFields::TMDB_ID, tmdb_id)?)
    }

    pub fn find_by_tmdb_ids(&self, tmdb_ids: &[i64]) -> Result<Vec<Movie>, OperationError> {
        self.query(
            self.builder()
                .in_set(MovieFields::TMDB_ID, tmdb_ids.iter().copied())?,
        )
    }

    pub fn find_by_title_slug(&self, slug: &str) -> Result<Option<Movie>, OperationError> {
        self.first(self.builder().equal(MovieFields::TITLE_SLUG, slug.to_string())?)
    }

    pub fn find_by_path(&self, path: &str) -> Result<Option<Movie>, OperationError> {
        self.first(self.builder().equal(MovieFields::PATH, path.to_string())?)
    }

    pub fn movie_path_exists(&self, path: &str) -> Result<bool, OperationError> {
        let builder = SqlBuilder::new::<Movie>().equal(MovieFields::PATH, path.to_string())?;
        Ok(self.count_where(builder)? > 0)
    }

    /// Movies with a cinema or physical release inside `[start, end]`.
    pub fn movies_between_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_unmonitored: bool,
    ) -> Result<Vec<Movie>, OperationError> {
        let (start, end) = (timestamp_value(&start), timestamp_value(&end));
        let mut builder = self
            .builder()
            .or_between(MovieFields::IN_CINEMAS, start.clone(), end.clone())?
            .or_between(MovieFields::PHYSICAL_RELEASE, start, end)?;
        if !include_unmonitored {
            builder = builder.equal(MovieFields::MONITORED, true)?;
        }
        self.query(builder)
    }

    pub fn movies_with_files(&self) -> Result<Vec<Movie>, OperationError> {
        self.query(self.builder().is_not_null(MovieFields::MOVIE_FILE_ID)?)
    }

    pub fn get_movies_by_file_id(&self, file_id: i64) -> Result<Vec<Movie>, OperationError> {
        self.query(self.builder().equal(MovieFields::MOVIE_FILE_ID, file_id)?)
    }

    /// Point a movie at its current file, or clear it.
    pub fn set_file_id(&self, movie_id: i64, file_id: Option<i64>) -> Result<(), OperationError> {
        let mut movie = self.get(movie_id)?;
        movie.movie_file_id = file_id;
        self.set_fields(&movie, &[MovieFields::MOVIE_FILE_ID])
    }

    pub fn all_movie_paths(&self) -> Result<Vec<String>, OperationError> {
        let query = SqlBuilder::new::<Movie>().select(r#""movies"."path""#);
        let conn = self.database().connection()?;
        Ok(query.read(&conn, |rows| {
            let mut paths: Vec<String> = Vec::new();
            while let Some(row) = rows.next()? {
                paths.push(row.get(0)?);
            }
            Ok(paths)
        })?)
    }

    /// One page of movies that have no file.
    pub fn movies_without_files(
        &self,
        spec: PagingSpec<Movie>,
    ) -> Result<PagingSpec<Movie>, OperationError> {
        let base = self.paged_builder().is_null(MovieFields::MOVIE_FILE_ID)?;
        self.list_with(spec, base)
    }

    fn first(&self, builder: SqlBuilder) -> Result<Option<Movie>, OperationError> {
        Ok(self.query(builder)?.into_iter().next())
    }
}
