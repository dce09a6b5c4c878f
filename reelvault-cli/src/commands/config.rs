use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_lib::{Settings, settings_path};

use crate::CliError;

/// Show the settings file, the effective values and the database they select.
pub(crate) fn run_config_show(settings: &Settings, db: Option<PathBuf>) -> Result<(), CliError> {
    let path = settings_path();

    log::info!(
        "{}",
        "reelvault Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found, using defaults)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let source = if db.is_some() {
        "--db"
    } else if settings.database.path.is_some() {
        "settings file"
    } else {
        "default"
    };
    let db_path = settings.resolve_db_path(db);
    log::info!(
        "  Database:      {} {}",
        db_path.display().if_supports_color(Stdout, |t| t.cyan()),
        format!("({})", source).if_supports_color(Stdout, |t| t.dimmed()),
    );
    crate::log_blank();

    let rendered = settings
        .to_toml()
        .map_err(|e| CliError::config(e.to_string()))?;
    for line in rendered.lines() {
        log::info!("  {}", line);
    }
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    println!("{}", settings_path().display());
    Ok(())
}
