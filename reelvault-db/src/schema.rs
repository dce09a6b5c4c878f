//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Create all tables and indexes if they don't exist.
///
/// Idempotent: safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    if get_schema_version(conn)? < CURRENT_VERSION {
        set_schema_version(conn, CURRENT_VERSION)?;
    }
    Ok(())
}

/// Bring a database of any known version up to [`CURRENT_VERSION`].
///
/// Empty databases get the full schema; older ones are migrated in place.
pub fn migrate_to_current(conn: &Connection) -> Result<i32, SchemaError> {
    let version = get_schema_version(conn)?;
    if version == 0 {
        create_schema(conn)?;
    } else if version != CURRENT_VERSION {
        migrate(conn, version)?;
    }
    Ok(version)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: from_version,
        });
    }

    let mut version = from_version;
    while version < CURRENT_VERSION {
        if version == 1 {
            conn.execute_batch("ALTER TABLE movie_files ADD COLUMN edition TEXT;")?;
        }
        version += 1;
        set_schema_version(conn, version)?;
        log::info!("Migrated library schema to version {}", version);
    }

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Quality profiles; items is a JSON array of {quality, allowed}
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    cutoff INTEGER NOT NULL,
    items TEXT NOT NULL,
    language TEXT
);

-- Movies
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    clean_title TEXT NOT NULL,
    sort_title TEXT NOT NULL,
    title_slug TEXT NOT NULL UNIQUE,
    imdb_id TEXT,
    tmdb_id INTEGER NOT NULL UNIQUE,
    year INTEGER,
    path TEXT NOT NULL,
    monitored BOOLEAN NOT NULL DEFAULT 1,
    profile_id INTEGER NOT NULL REFERENCES profiles(id),
    movie_file_id INTEGER REFERENCES movie_files(id) ON DELETE SET NULL,
    in_cinemas TEXT,
    physical_release TEXT,
    added TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_movies_clean_title ON movies(clean_title);
CREATE INDEX IF NOT EXISTS idx_movies_imdb ON movies(imdb_id);
CREATE INDEX IF NOT EXISTS idx_movies_path ON movies(path);
CREATE INDEX IF NOT EXISTS idx_movies_profile ON movies(profile_id);
CREATE INDEX IF NOT EXISTS idx_movies_file ON movies(movie_file_id);

-- Imported files; quality is the serialized quality blob
CREATE TABLE IF NOT EXISTS movie_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    relative_path TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    date_added TEXT NOT NULL,
    quality TEXT,
    media_info TEXT,
    scene_name TEXT,
    release_group TEXT,
    edition TEXT
);

CREATE INDEX IF NOT EXISTS idx_movie_files_movie ON movie_files(movie_id);

CREATE TABLE IF NOT EXISTS alternative_titles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    clean_title TEXT NOT NULL,
    source_type TEXT NOT NULL,
    source_id INTEGER NOT NULL DEFAULT 0,
    language TEXT
);

CREATE INDEX IF NOT EXISTS idx_alt_titles_movie ON alternative_titles(movie_id);
CREATE INDEX IF NOT EXISTS idx_alt_titles_clean ON alternative_titles(clean_title);
CREATE INDEX IF NOT EXISTS idx_alt_titles_source ON alternative_titles(source_id);

-- Grab/import history; data is a JSON object of string pairs
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    source_title TEXT NOT NULL,
    quality TEXT,
    date TEXT NOT NULL,
    event_type INTEGER NOT NULL,
    download_id TEXT,
    data TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_history_movie ON history(movie_id);
CREATE INDEX IF NOT EXISTS idx_history_download ON history(download_id);
CREATE INDEX IF NOT EXISTS idx_history_date ON history(date);

CREATE TABLE IF NOT EXISTS blacklist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    source_title TEXT NOT NULL,
    quality TEXT,
    date TEXT NOT NULL,
    published_date TEXT,
    size INTEGER,
    protocol INTEGER NOT NULL DEFAULT 0,
    indexer TEXT,
    message TEXT,
    torrent_info_hash TEXT
);

CREATE INDEX IF NOT EXISTS idx_blacklist_movie ON blacklist(movie_id);

-- Key/value settings stored with the library
CREATE TABLE IF NOT EXISTS config (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL
);

-- Background command records
CREATE TABLE IF NOT EXISTS commands (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    body TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    triggered_by INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL,
    queued_at TEXT NOT NULL,
    started_at TEXT,
    ended_at TEXT,
    duration INTEGER,
    exception TEXT
);

CREATE INDEX IF NOT EXISTS idx_commands_status ON commands(status);
CREATE INDEX IF NOT EXISTS idx_commands_ended ON commands(ended_at);

-- Application log
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time TEXT NOT NULL,
    level TEXT NOT NULL,
    logger TEXT NOT NULL,
    message TEXT NOT NULL,
    exception TEXT,
    exception_type TEXT
);

CREATE INDEX IF NOT EXISTS idx_logs_time ON logs(time);
"#;
