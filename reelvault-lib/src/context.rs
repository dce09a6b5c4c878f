//! The open library: one pool, its repositories, and opt-in startup recovery.

use std::path::Path;
use std::sync::Arc;

use reelvault_db::{
    AlternativeTitleRepository, BlacklistRepository, CommandRepository, ConfigRepository,
    CutoffDecisionEngine, Database, EventSink, HistoryRepository, LogRepository,
    MovieFileRepository, MovieRepository, NullSink, ProfileRepository,
};

use crate::error::LibraryError;
use crate::settings::Settings;

/// Entry point for callers. Opening a library brings the schema up to date
/// and leaves command state alone, so inspecting a database never touches
/// commands another process is running.
///
/// The process that owns command execution opens with
/// [`Library::open_and_recover`], which also marks commands left `Started`
/// by a previous run as orphaned.
#[derive(Clone)]
pub struct Library {
    db: Database,
    movies: MovieRepository,
    files: MovieFileRepository,
    titles: AlternativeTitleRepository,
    profiles: ProfileRepository,
    history: HistoryRepository,
    blacklist: BlacklistRepository,
    config: ConfigRepository,
    commands: CommandRepository,
    logs: LogRepository,
    cutoff: CutoffDecisionEngine,
    recovered: usize,
}

impl Library {
    pub fn open(path: &Path, pool_size: usize) -> Result<Self, LibraryError> {
        Self::open_with_events(path, pool_size, Arc::new(NullSink))
    }

    /// Open as the command host: anything still `Started` belongs to a run
    /// that is gone and is marked orphaned.
    pub fn open_and_recover(path: &Path, pool_size: usize) -> Result<Self, LibraryError> {
        let mut library = Self::open(path, pool_size)?;
        library.recover_interrupted()?;
        Ok(library)
    }

    /// Open the database named by `settings`, unless `cli_override` names
    /// another one.
    pub fn open_with_settings(
        settings: &Settings,
        cli_override: Option<std::path::PathBuf>,
    ) -> Result<Self, LibraryError> {
        let path = settings.resolve_db_path(cli_override);
        Self::open(&path, settings.database.pool_size)
    }

    pub fn open_with_events(
        path: &Path,
        pool_size: usize,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, LibraryError> {
        let db = Database::open(path, pool_size)?;
        Self::from_database(db, events)
    }

    pub fn in_memory() -> Result<Self, LibraryError> {
        Self::from_database(Database::open_memory()?, Arc::new(NullSink))
    }

    /// Build the repositories over `db`.
    pub fn from_database(db: Database, events: Arc<dyn EventSink>) -> Result<Self, LibraryError> {
        let movies = MovieRepository::new(db.clone(), Arc::clone(&events));
        let profiles = ProfileRepository::new(db.clone(), Arc::clone(&events));
        let commands = CommandRepository::new(db.clone(), Arc::clone(&events));

        Ok(Self {
            files: MovieFileRepository::new(db.clone(), Arc::clone(&events)),
            titles: AlternativeTitleRepository::new(db.clone(), Arc::clone(&events)),
            history: HistoryRepository::new(db.clone(), Arc::clone(&events)),
            blacklist: BlacklistRepository::new(db.clone(), Arc::clone(&events)),
            config: ConfigRepository::new(db.clone(), Arc::clone(&events)),
            logs: LogRepository::new(db.clone(), events),
            cutoff: CutoffDecisionEngine::new(movies.clone(), profiles.clone()),
            movies,
            profiles,
            commands,
            db,
            recovered: 0,
        })
    }

    /// Mark every `Started` command as orphaned. Only the process that runs
    /// commands may call this, and only before it starts any.
    pub fn recover_interrupted(&mut self) -> Result<usize, LibraryError> {
        let orphaned = self.commands.orphan_started()?;
        self.recovered += orphaned;
        Ok(orphaned)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Commands marked orphaned by [`Library::recover_interrupted`] so far.
    pub fn recovered_commands(&self) -> usize {
        self.recovered
    }

    pub fn movies(&self) -> &MovieRepository {
        &self.movies
    }

    pub fn files(&self) -> &MovieFileRepository {
        &self.files
    }

    pub fn alternative_titles(&self) -> &AlternativeTitleRepository {
        &self.titles
    }

    pub fn profiles(&self) -> &ProfileRepository {
        &self.profiles
    }

    pub fn history(&self) -> &HistoryRepository {
        &self.history
    }

    pub fn blacklist(&self) -> &BlacklistRepository {
        &self.blacklist
    }

    pub fn config(&self) -> &ConfigRepository {
        &self.config
    }

    pub fn commands(&self) -> &CommandRepository {
        &self.commands
    }

    pub fn logs(&self) -> &LogRepository {
        &self.logs
    }

    pub fn cutoff(&self) -> &CutoffDecisionEngine {
        &self.cutoff
    }
}
