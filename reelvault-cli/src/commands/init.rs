use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_db::schema::CURRENT_VERSION;
use reelvault_lib::{Library, Settings};

use crate::CliError;

/// Create or migrate the library database, optionally remembering its path.
pub(crate) fn run_init(settings: &Settings, db: Option<PathBuf>, save: bool) -> Result<(), CliError> {
    let path = settings.resolve_db_path(db);
    let existed = path.exists();

    let library = Library::open(&path, settings.database.pool_size)
        .map_err(|e| CliError::database(format!("Failed to open {}: {}", path.display(), e)))?;

    log::info!(
        "{} {} library database at {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        if existed { "Opened" } else { "Created" },
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!("  Schema version: {}", CURRENT_VERSION);

    let count = |n: Result<u64, reelvault_lib::OperationError>| {
        n.map_err(|e| CliError::database(format!("Failed to count records: {}", e)))
    };
    log::info!("  Movies:         {:>8}", count(library.movies().count())?);
    log::info!("  Profiles:       {:>8}", count(library.profiles().count())?);
    log::info!("  Commands:       {:>8}", count(library.commands().count())?);

    if save {
        let mut updated = settings.clone();
        updated.database.path = Some(path.clone());
        updated
            .save()
            .map_err(|e| CliError::config(format!("Failed to save settings: {}", e)))?;
        log::info!(
            "  Saved database path to {}",
            reelvault_lib::settings_path().display()
        );
    }
    Ok(())
}
