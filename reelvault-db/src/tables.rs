//! Table registrations for every persisted catalog type, and the field
//! selectors callers use to build conditions against them.

use chrono::TimeDelta;
use reelvault_catalog::{
    AlternativeTitle, Blacklist, CommandModel, CommandPriority, CommandStatus, CommandTrigger,
    ConfigEntry, DownloadProtocol, History, HistoryEventType, LogEntry, LogLevel, Movie,
    MovieFile, QualityProfile, SourceType,
};
use rusqlite::Row;
use rusqlite::types::{FromSqlError, Type, Value};

use crate::mapping::{
    Entity, Field, json_value, opt_text_value, opt_timestamp_value, quality_value, read_json,
    read_opt_timestamp, read_quality, read_timestamp, text_value, timestamp_value,
};

fn out_of_range(idx: usize, code: i64) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(FromSqlError::OutOfRange(code)))
}

// ── Movies ──────────────────────────────────────────────────────────────────

impl Entity for Movie {
    const TABLE: &'static str = "movies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "clean_title",
        "sort_title",
        "title_slug",
        "imdb_id",
        "tmdb_id",
        "year",
        "path",
        "monitored",
        "profile_id",
        "movie_file_id",
        "in_cinemas",
        "physical_release",
        "added",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        Ok(Movie {
            id: row.get(o)?,
            title: row.get(o + 1)?,
            clean_title: row.get(o + 2)?,
            sort_title: row.get(o + 3)?,
            title_slug: row.get(o + 4)?,
            imdb_id: row.get(o + 5)?,
            tmdb_id: row.get(o + 6)?,
            year: row.get(o + 7)?,
            path: row.get(o + 8)?,
            monitored: row.get(o + 9)?,
            profile_id: row.get(o + 10)?,
            movie_file_id: row.get(o + 11)?,
            in_cinemas: read_opt_timestamp(row, o + 12)?,
            physical_release: read_opt_timestamp(row, o + 13)?,
            added: read_timestamp(row, o + 14)?,
            profile: None,
            alternative_titles: Vec::new(),
            movie_file: None,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            text_value(&self.title),
            text_value(&self.clean_title),
            text_value(&self.sort_title),
            text_value(&self.title_slug),
            opt_text_value(self.imdb_id.as_deref()),
            self.tmdb_id.into(),
            self.year.into(),
            text_value(&self.path),
            self.monitored.into(),
            self.profile_id.into(),
            self.movie_file_id.into(),
            opt_timestamp_value(self.in_cinemas.as_ref()),
            opt_timestamp_value(self.physical_release.as_ref()),
            timestamp_value(&self.added),
        ])
    }
}

/// Field selectors for [`Movie`].
pub struct MovieFields;

impl MovieFields {
    pub const ID: Field<Movie> = Field::id();
    pub const TITLE: Field<Movie> = Field::new("title");
    pub const CLEAN_TITLE: Field<Movie> = Field::new("clean_title");
    pub const SORT_TITLE: Field<Movie> = Field::new("sort_title");
    pub const TITLE_SLUG: Field<Movie> = Field::new("title_slug");
    pub const IMDB_ID: Field<Movie> = Field::new("imdb_id");
    pub const TMDB_ID: Field<Movie> = Field::new("tmdb_id");
    pub const YEAR: Field<Movie> = Field::new("year");
    pub const PATH: Field<Movie> = Field::new("path");
    pub const MONITORED: Field<Movie> = Field::new("monitored");
    pub const PROFILE_ID: Field<Movie> = Field::new("profile_id");
    pub const MOVIE_FILE_ID: Field<Movie> = Field::new("movie_file_id");
    pub const IN_CINEMAS: Field<Movie> = Field::new("in_cinemas");
    pub const PHYSICAL_RELEASE: Field<Movie> = Field::new("physical_release");
    pub const ADDED: Field<Movie> = Field::new("added");
}

// ── Movie Files ─────────────────────────────────────────────────────────────

impl Entity for MovieFile {
    const TABLE: &'static str = "movie_files";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "movie_id",
        "relative_path",
        "size",
        "date_added",
        "quality",
        "media_info",
        "scene_name",
        "release_group",
        "edition",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        Ok(MovieFile {
            id: row.get(o)?,
            movie_id: row.get(o + 1)?,
            relative_path: row.get(o + 2)?,
            size: row.get(o + 3)?,
            date_added: read_timestamp(row, o + 4)?,
            quality: read_quality(row, o + 5)?,
            media_info: row.get(o + 6)?,
            scene_name: row.get(o + 7)?,
            release_group: row.get(o + 8)?,
            edition: row.get(o + 9)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            self.movie_id.into(),
            text_value(&self.relative_path),
            self.size.into(),
            timestamp_value(&self.date_added),
            quality_value(self.quality.as_ref())?,
            opt_text_value(self.media_info.as_deref()),
            opt_text_value(self.scene_name.as_deref()),
            opt_text_value(self.release_group.as_deref()),
            opt_text_value(self.edition.as_deref()),
        ])
    }
}

pub struct MovieFileFields;

impl MovieFileFields {
    pub const ID: Field<MovieFile> = Field::id();
    pub const MOVIE_ID: Field<MovieFile> = Field::new("movie_id");
    pub const RELATIVE_PATH: Field<MovieFile> = Field::new("relative_path");
    pub const SIZE: Field<MovieFile> = Field::new("size");
    pub const DATE_ADDED: Field<MovieFile> = Field::new("date_added");
    /// The serialized quality blob.
    pub const QUALITY: Field<MovieFile> = Field::new("quality");
    pub const MEDIA_INFO: Field<MovieFile> = Field::new("media_info");
    pub const SCENE_NAME: Field<MovieFile> = Field::new("scene_name");
    pub const RELEASE_GROUP: Field<MovieFile> = Field::new("release_group");
    pub const EDITION: Field<MovieFile> = Field::new("edition");
}

// ── Alternative Titles ──────────────────────────────────────────────────────

impl Entity for AlternativeTitle {
    const TABLE: &'static str = "alternative_titles";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "movie_id",
        "title",
        "clean_title",
        "source_type",
        "source_id",
        "language",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        let source_type: String = row.get(o + 4)?;
        Ok(AlternativeTitle {
            id: row.get(o)?,
            movie_id: row.get(o + 1)?,
            title: row.get(o + 2)?,
            clean_title: row.get(o + 3)?,
            source_type: SourceType::from_str_loose(&source_type),
            source_id: row.get(o + 5)?,
            language: row.get(o + 6)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            self.movie_id.into(),
            text_value(&self.title),
            text_value(&self.clean_title),
            text_value(self.source_type.as_str()),
            self.source_id.into(),
            opt_text_value(self.language.as_deref()),
        ])
    }
}

pub struct AlternativeTitleFields;

impl AlternativeTitleFields {
    pub const ID: Field<AlternativeTitle> = Field::id();
    pub const MOVIE_ID: Field<AlternativeTitle> = Field::new("movie_id");
    pub const TITLE: Field<AlternativeTitle> = Field::new("title");
    pub const CLEAN_TITLE: Field<AlternativeTitle> = Field::new("clean_title");
    pub const SOURCE_TYPE: Field<AlternativeTitle> = Field::new("source_type");
    pub const SOURCE_ID: Field<AlternativeTitle> = Field::new("source_id");
    pub const LANGUAGE: Field<AlternativeTitle> = Field::new("language");
}

// ── Quality Profiles ────────────────────────────────────────────────────────

impl Entity for QualityProfile {
    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] = &["id", "name", "cutoff", "items", "language"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        let cutoff: i64 = row.get(o + 2)?;
        Ok(QualityProfile {
            id: row.get(o)?,
            name: row.get(o + 1)?,
            cutoff: usize::try_from(cutoff).map_err(|_| out_of_range(o + 2, cutoff))?,
            items: read_json(row, o + 3)?,
            language: row.get(o + 4)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        let cutoff = i64::try_from(self.cutoff)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(vec![
            text_value(&self.name),
            cutoff.into(),
            json_value(&self.items)?,
            opt_text_value(self.language.as_deref()),
        ])
    }
}

pub struct ProfileFields;

impl ProfileFields {
    pub const ID: Field<QualityProfile> = Field::id();
    pub const NAME: Field<QualityProfile> = Field::new("name");
    pub const CUTOFF: Field<QualityProfile> = Field::new("cutoff");
    pub const ITEMS: Field<QualityProfile> = Field::new("items");
    pub const LANGUAGE: Field<QualityProfile> = Field::new("language");
}

// ── History ─────────────────────────────────────────────────────────────────

impl Entity for History {
    const TABLE: &'static str = "history";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "movie_id",
        "source_title",
        "quality",
        "date",
        "event_type",
        "download_id",
        "data",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        Ok(History {
            id: row.get(o)?,
            movie_id: row.get(o + 1)?,
            source_title: row.get(o + 2)?,
            quality: read_quality(row, o + 3)?,
            date: read_timestamp(row, o + 4)?,
            event_type: HistoryEventType::from_code(row.get(o + 5)?),
            download_id: row.get(o + 6)?,
            data: read_json(row, o + 7)?,
            movie: None,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            self.movie_id.into(),
            text_value(&self.source_title),
            quality_value(self.quality.as_ref())?,
            timestamp_value(&self.date),
            self.event_type.code().into(),
            opt_text_value(self.download_id.as_deref()),
            json_value(&self.data)?,
        ])
    }
}

pub struct HistoryFields;

impl HistoryFields {
    pub const ID: Field<History> = Field::id();
    pub const MOVIE_ID: Field<History> = Field::new("movie_id");
    pub const SOURCE_TITLE: Field<History> = Field::new("source_title");
    pub const QUALITY: Field<History> = Field::new("quality");
    pub const DATE: Field<History> = Field::new("date");
    pub const EVENT_TYPE: Field<History> = Field::new("event_type");
    pub const DOWNLOAD_ID: Field<History> = Field::new("download_id");
    pub const DATA: Field<History> = Field::new("data");
}

// ── Blacklist ───────────────────────────────────────────────────────────────

impl Entity for Blacklist {
    const TABLE: &'static str = "blacklist";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "movie_id",
        "source_title",
        "quality",
        "date",
        "published_date",
        "size",
        "protocol",
        "indexer",
        "message",
        "torrent_info_hash",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        Ok(Blacklist {
            id: row.get(o)?,
            movie_id: row.get(o + 1)?,
            source_title: row.get(o + 2)?,
            quality: read_quality(row, o + 3)?,
            date: read_timestamp(row, o + 4)?,
            published_date: read_opt_timestamp(row, o + 5)?,
            size: row.get(o + 6)?,
            protocol: DownloadProtocol::from_code(row.get(o + 7)?),
            indexer: row.get(o + 8)?,
            message: row.get(o + 9)?,
            torrent_info_hash: row.get(o + 10)?,
            movie: None,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            self.movie_id.into(),
            text_value(&self.source_title),
            quality_value(self.quality.as_ref())?,
            timestamp_value(&self.date),
            opt_timestamp_value(self.published_date.as_ref()),
            self.size.into(),
            self.protocol.code().into(),
            opt_text_value(self.indexer.as_deref()),
            opt_text_value(self.message.as_deref()),
            opt_text_value(self.torrent_info_hash.as_deref()),
        ])
    }
}

pub struct BlacklistFields;

impl BlacklistFields {
    pub const ID: Field<Blacklist> = Field::id();
    pub const MOVIE_ID: Field<Blacklist> = Field::new("movie_id");
    pub const SOURCE_TITLE: Field<Blacklist> = Field::new("source_title");
    pub const QUALITY: Field<Blacklist> = Field::new("quality");
    pub const DATE: Field<Blacklist> = Field::new("date");
    pub const PUBLISHED_DATE: Field<Blacklist> = Field::new("published_date");
    pub const SIZE: Field<Blacklist> = Field::new("size");
    pub const PROTOCOL: Field<Blacklist> = Field::new("protocol");
    pub const INDEXER: Field<Blacklist> = Field::new("indexer");
    pub const MESSAGE: Field<Blacklist> = Field::new("message");
    pub const TORRENT_INFO_HASH: Field<Blacklist> = Field::new("torrent_info_hash");
}

// ── Config ──────────────────────────────────────────────────────────────────

impl Entity for ConfigEntry {
    const TABLE: &'static str = "config";
    const COLUMNS: &'static [&'static str] = &["id", "key", "value"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        Ok(ConfigEntry {
            id: row.get(o)?,
            key: row.get(o + 1)?,
            value: row.get(o + 2)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![text_value(&self.key), text_value(&self.value)])
    }
}

pub struct ConfigFields;

impl ConfigFields {
    pub const ID: Field<ConfigEntry> = Field::id();
    pub const KEY: Field<ConfigEntry> = Field::new("key");
    pub const VALUE: Field<ConfigEntry> = Field::new("value");
}

// ── Commands ────────────────────────────────────────────────────────────────

impl Entity for CommandModel {
    const TABLE: &'static str = "commands";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "body",
        "priority",
        "triggered_by",
        "status",
        "queued_at",
        "started_at",
        "ended_at",
        "duration",
        "exception",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        let status: i64 = row.get(o + 5)?;
        let duration: Option<i64> = row.get(o + 9)?;
        Ok(CommandModel {
            id: row.get(o)?,
            name: row.get(o + 1)?,
            body: read_json(row, o + 2)?,
            priority: CommandPriority::from_code(row.get(o + 3)?),
            trigger: CommandTrigger::from_code(row.get(o + 4)?),
            status: CommandStatus::from_code(status).ok_or_else(|| out_of_range(o + 5, status))?,
            queued_at: read_timestamp(row, o + 6)?,
            started_at: read_opt_timestamp(row, o + 7)?,
            ended_at: read_opt_timestamp(row, o + 8)?,
            duration: duration.map(TimeDelta::milliseconds),
            exception: row.get(o + 10)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            text_value(&self.name),
            json_value(&self.body)?,
            self.priority.code().into(),
            self.trigger.code().into(),
            self.status.code().into(),
            timestamp_value(&self.queued_at),
            opt_timestamp_value(self.started_at.as_ref()),
            opt_timestamp_value(self.ended_at.as_ref()),
            self.duration.map(|d| d.num_milliseconds()).into(),
            opt_text_value(self.exception.as_deref()),
        ])
    }
}

pub struct CommandFields;

impl CommandFields {
    pub const ID: Field<CommandModel> = Field::id();
    pub const NAME: Field<CommandModel> = Field::new("name");
    pub const BODY: Field<CommandModel> = Field::new("body");
    pub const PRIORITY: Field<CommandModel> = Field::new("priority");
    pub const TRIGGER: Field<CommandModel> = Field::new("triggered_by");
    pub const STATUS: Field<CommandModel> = Field::new("status");
    pub const QUEUED_AT: Field<CommandModel> = Field::new("queued_at");
    pub const STARTED_AT: Field<CommandModel> = Field::new("started_at");
    pub const ENDED_AT: Field<CommandModel> = Field::new("ended_at");
    pub const DURATION: Field<CommandModel> = Field::new("duration");
    pub const EXCEPTION: Field<CommandModel> = Field::new("exception");
}

// ── Logs ────────────────────────────────────────────────────────────────────

impl Entity for LogEntry {
    const TABLE: &'static str = "logs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "time",
        "level",
        "logger",
        "message",
        "exception",
        "exception_type",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>, o: usize) -> rusqlite::Result<Self> {
        let level: String = row.get(o + 2)?;
        let level = LogLevel::from_str_loose(&level).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                o + 2,
                Type::Text,
                format!("unknown log level '{level}'").into(),
            )
        })?;
        Ok(LogEntry {
            id: row.get(o)?,
            time: read_timestamp(row, o + 1)?,
            level,
            logger: row.get(o + 3)?,
            message: row.get(o + 4)?,
            exception: row.get(o + 5)?,
            exception_type: row.get(o + 6)?,
        })
    }

    fn to_values(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            timestamp_value(&self.time),
            text_value(self.level.as_str()),
            text_value(&self.logger),
            text_value(&self.message),
            opt_text_value(self.exception.as_deref()),
            opt_text_value(self.exception_type.as_deref()),
        ])
    }
}

pub struct LogFields;

impl LogFields {
    pub const ID: Field<LogEntry> = Field::id();
    pub const TIME: Field<LogEntry> = Field::new("time");
    pub const LEVEL: Field<LogEntry> = Field::new("level");
    pub const LOGGER: Field<LogEntry> = Field::new("logger");
    pub const MESSAGE: Field<LogEntry> = Field::new("message");
    pub const EXCEPTION: Field<LogEntry> = Field::new("exception");
    pub const EXCEPTION_TYPE: Field<LogEntry> = Field::new("exception_type");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mapped<T: Entity>(fields: &[Field<T>]) {
        for field in fields {
            assert!(field.column().is_ok(), "{}.{} is not mapped", T::TABLE, field.name());
        }
        // Every column has a selector.
        assert_eq!(fields.len(), T::COLUMNS.len(), "{} selectors out of date", T::TABLE);
    }

    #[test]
    fn every_field_selector_is_mapped() {
        use MovieFields as M;
        assert_mapped(&[
            M::ID, M::TITLE, M::CLEAN_TITLE, M::SORT_TITLE, M::TITLE_SLUG, M::IMDB_ID,
            M::TMDB_ID, M::YEAR, M::PATH, M::MONITORED, M::PROFILE_ID, M::MOVIE_FILE_ID,
            M::IN_CINEMAS, M::PHYSICAL_RELEASE, M::ADDED,
        ]);

        use MovieFileFields as F;
        assert_mapped(&[
            F::ID, F::MOVIE_ID, F::RELATIVE_PATH, F::SIZE, F::DATE_ADDED, F::QUALITY,
            F::MEDIA_INFO, F::SCENE_NAME, F::RELEASE_GROUP, F::EDITION,
        ]);

        use AlternativeTitleFields as A;
        assert_mapped(&[
            A::ID, A::MOVIE_ID, A::TITLE, A::CLEAN_TITLE, A::SOURCE_TYPE, A::SOURCE_ID,
            A::LANGUAGE,
        ]);

        use ProfileFields as P;
        assert_mapped(&[P::ID, P::NAME, P::CUTOFF, P::ITEMS, P::LANGUAGE]);

        use HistoryFields as H;
        assert_mapped(&[
            H::ID, H::MOVIE_ID, H::SOURCE_TITLE, H::QUALITY, H::DATE, H::EVENT_TYPE,
            H::DOWNLOAD_ID, H::DATA,
        ]);

        use BlacklistFields as B;
        assert_mapped(&[
            B::ID, B::MOVIE_ID, B::SOURCE_TITLE, B::QUALITY, B::DATE, B::PUBLISHED_DATE,
            B::SIZE, B::PROTOCOL, B::INDEXER, B::MESSAGE, B::TORRENT_INFO_HASH,
        ]);

        use ConfigFields as C;
        assert_mapped(&[C::ID, C::KEY, C::VALUE]);

        use CommandFields as Cmd;
        assert_mapped(&[
            Cmd::ID, Cmd::NAME, Cmd::BODY, Cmd::PRIORITY, Cmd::TRIGGER, Cmd::STATUS,
            Cmd::QUEUED_AT, Cmd::STARTED_AT, Cmd::ENDED_AT, Cmd::DURATION, Cmd::EXCEPTION,
        ]);

        use LogFields as L;
        assert_mapped(&[
            L::ID, L::TIME, L::LEVEL, L::LOGGER, L::MESSAGE, L::EXCEPTION, L::EXCEPTION_TYPE,
        ]);
    }

    #[test]
    fn values_line_up_with_columns() {
        let movie = Movie::new("Alien", 348, 1, chrono::Utc::now());
        assert_eq!(movie.to_values().unwrap().len(), Movie::COLUMNS.len() - 1);

        let cmd = CommandModel::queued("Refresh", serde_json::json!({}), chrono::Utc::now());
        assert_eq!(cmd.to_values().unwrap().len(), CommandModel::COLUMNS.len() - 1);

        let profile = QualityProfile::new("HD", &[1, 2, 3], 1);
        assert_eq!(profile.to_values().unwrap().len(), QualityProfile::COLUMNS.len() - 1);
    }
}
