//! Data model types for the movie library.
//!
//! These types represent the persistent library schema: movies, their files
//! and alternative titles, quality profiles, grab history, the blacklist,
//! key/value configuration and the application log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quality::QualityModel;

// ── Movie ───────────────────────────────────────────────────────────────────

/// A movie tracked by the library.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub clean_title: String,
    pub sort_title: String,
    pub title_slug: String,
    pub imdb_id: Option<String>,
    pub tmdb_id: i64,
    pub year: Option<i32>,
    pub path: String,
    pub monitored: bool,
    pub profile_id: i64,
    /// `None` until a file has been imported.
    pub movie_file_id: Option<i64>,
    pub in_cinemas: Option<DateTime<Utc>>,
    pub physical_release: Option<DateTime<Utc>>,
    pub added: DateTime<Utc>,

    // Populated by joined reads only.
    pub profile: Option<QualityProfile>,
    pub alternative_titles: Vec<AlternativeTitle>,
    pub movie_file: Option<MovieFile>,
}

impl Movie {
    /// A new, unsaved movie with derived title keys filled in.
    pub fn new(title: impl Into<String>, tmdb_id: i64, profile_id: i64, added: DateTime<Utc>) -> Self {
        let title = title.into();
        let clean = crate::title::clean_title(&title);
        Self {
            id: 0,
            sort_title: clean.clone(),
            title_slug: format!("{}-{}", clean, tmdb_id),
            clean_title: clean,
            title,
            imdb_id: None,
            tmdb_id,
            year: None,
            path: String::new(),
            monitored: true,
            profile_id,
            movie_file_id: None,
            in_cinemas: None,
            physical_release: None,
            added,
            profile: None,
            alternative_titles: Vec::new(),
            movie_file: None,
        }
    }

    pub fn has_file(&self) -> bool {
        self.movie_file_id.is_some()
    }
}

// ── Movie File ──────────────────────────────────────────────────────────────

/// An imported file on disk belonging to a movie.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFile {
    pub id: i64,
    pub movie_id: i64,
    pub relative_path: String,
    pub size: i64,
    pub date_added: DateTime<Utc>,
    /// `None` if the stored blob could not be decoded.
    pub quality: Option<QualityModel>,
    /// Probed media info as a JSON document, absent until scanned.
    pub media_info: Option<String>,
    pub scene_name: Option<String>,
    pub release_group: Option<String>,
    pub edition: Option<String>,
}

// ── Alternative Title ───────────────────────────────────────────────────────

/// Where an alternative title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    Tmdb,
    Mappings,
    User,
    Indexer,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tmdb => "tmdb",
            Self::Mappings => "mappings",
            Self::User => "user",
            Self::Indexer => "indexer",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mappings" => Self::Mappings,
            "user" => Self::User,
            "indexer" => Self::Indexer,
            _ => Self::Tmdb,
        }
    }
}

/// Another title a movie is known by (translations, working titles, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeTitle {
    pub id: i64,
    pub movie_id: i64,
    pub title: String,
    pub clean_title: String,
    pub source_type: SourceType,
    pub source_id: i64,
    pub language: Option<String>,
}

impl AlternativeTitle {
    pub fn new(movie_id: i64, title: impl Into<String>, source_type: SourceType, source_id: i64) -> Self {
        let title = title.into();
        Self {
            id: 0,
            movie_id,
            clean_title: crate::title::clean_title(&title),
            title,
            source_type,
            source_id,
            language: None,
        }
    }
}

// ── Quality Profile ─────────────────────────────────────────────────────────

/// One ranked entry of a quality profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileQualityItem {
    pub quality: i32,
    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

fn default_allowed() -> bool {
    true
}

/// An ordered quality ranking (lowest first) with a cutoff position.
///
/// Items at positions before `cutoff` are "below cutoff": a movie whose file
/// has one of those qualities is still eligible for an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
    pub cutoff: usize,
    pub items: Vec<ProfileQualityItem>,
    pub language: Option<String>,
}

impl QualityProfile {
    pub fn new(name: impl Into<String>, ranking: &[i32], cutoff: usize) -> Self {
        Self {
            id: 0,
            name: name.into(),
            cutoff,
            items: ranking
                .iter()
                .map(|&quality| ProfileQualityItem {
                    quality,
                    allowed: true,
                })
                .collect(),
            language: None,
        }
    }

    /// Quality ids in rank order.
    pub fn ranking(&self) -> Vec<i32> {
        self.items.iter().map(|i| i.quality).collect()
    }

    /// Quality ids ranked before the cutoff position, in rank order.
    ///
    /// A cutoff past the end of the ranking treats every quality as below it.
    pub fn below_cutoff(&self) -> Vec<i32> {
        let end = self.cutoff.min(self.items.len());
        self.items[..end].iter().map(|i| i.quality).collect()
    }

    /// The quality sitting at the cutoff position, if any.
    pub fn cutoff_quality(&self) -> Option<i32> {
        self.items.get(self.cutoff).map(|i| i.quality)
    }
}

// ── History ─────────────────────────────────────────────────────────────────

/// Kind of event recorded in the grab/import history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryEventType {
    Unknown,
    Grabbed,
    DownloadFolderImported,
    DownloadFailed,
    MovieFileDeleted,
    MovieFolderImported,
    MovieFileRenamed,
}

impl HistoryEventType {
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Grabbed => 1,
            Self::DownloadFolderImported => 3,
            Self::DownloadFailed => 4,
            Self::MovieFileDeleted => 6,
            Self::MovieFolderImported => 8,
            Self::MovieFileRenamed => 9,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Grabbed,
            3 => Self::DownloadFolderImported,
            4 => Self::DownloadFailed,
            6 => Self::MovieFileDeleted,
            8 => Self::MovieFolderImported,
            9 => Self::MovieFileRenamed,
            _ => Self::Unknown,
        }
    }
}

/// One history record for a movie.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub id: i64,
    pub movie_id: i64,
    pub source_title: String,
    pub quality: Option<QualityModel>,
    pub date: DateTime<Utc>,
    pub event_type: HistoryEventType,
    pub download_id: Option<String>,
    pub data: BTreeMap<String, String>,

    // Populated by the paged listing only.
    pub movie: Option<Box<Movie>>,
}

impl History {
    pub fn new(
        movie_id: i64,
        source_title: impl Into<String>,
        quality: QualityModel,
        event_type: HistoryEventType,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            movie_id,
            source_title: source_title.into(),
            quality: Some(quality),
            date,
            event_type,
            download_id: None,
            data: BTreeMap::new(),
            movie: None,
        }
    }
}

// ── Blacklist ───────────────────────────────────────────────────────────────

/// Transfer protocol of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownloadProtocol {
    #[default]
    Unknown,
    Usenet,
    Torrent,
}

impl DownloadProtocol {
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Usenet => 1,
            Self::Torrent => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Usenet,
            2 => Self::Torrent,
            _ => Self::Unknown,
        }
    }
}

/// A release that must not be grabbed again for a movie.
#[derive(Debug, Clone, PartialEq)]
pub struct Blacklist {
    pub id: i64,
    pub movie_id: i64,
    pub source_title: String,
    pub quality: Option<QualityModel>,
    pub date: DateTime<Utc>,
    pub published_date: Option<DateTime<Utc>>,
    pub size: Option<i64>,
    pub protocol: DownloadProtocol,
    pub indexer: Option<String>,
    pub message: Option<String>,
    pub torrent_info_hash: Option<String>,

    // Populated by the paged listing only.
    pub movie: Option<Box<Movie>>,
}

// ── Config ──────────────────────────────────────────────────────────────────

/// A key/value configuration entry stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub id: i64,
    pub key: String,
    pub value: String,
}

// ── Log ─────────────────────────────────────────────────────────────────────

/// Severity of a persisted log entry, most severe last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warn => "Warn",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "fatal" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// This level and every more severe one.
    pub fn at_least(self) -> Vec<LogLevel> {
        Self::ALL.iter().copied().filter(|l| *l >= self).collect()
    }
}

/// A persisted application log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub logger: String,
    pub message: String,
    pub exception: Option<String>,
    pub exception_type: Option<String>,
}
