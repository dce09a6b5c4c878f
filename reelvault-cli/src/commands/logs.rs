use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_lib::{LogEntry, LogLevel, Settings, SortDirection};

use crate::CliError;
use crate::cli_types::PageArgs;

use super::{format_time, log_page_footer, open_existing, page_spec, truncate_str};

pub(crate) fn run_logs(
    settings: &Settings,
    db: Option<PathBuf>,
    level: Option<String>,
    page: &PageArgs,
) -> Result<(), CliError> {
    let min_level = level
        .map(|l| {
            LogLevel::from_str_loose(&l)
                .ok_or_else(|| CliError::invalid_argument(format!("Unknown log level '{}'", l)))
        })
        .transpose()?;

    let Some(library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let spec = page_spec::<LogEntry>(page, settings, "time", SortDirection::Descending);
    let spec = library
        .logs()
        .list_logs(spec, min_level)
        .map_err(|e| CliError::database(format!("Failed to list logs: {}", e)))?;

    if spec.total_records == 0 {
        log::info!("No log entries.");
        return Ok(());
    }
    for entry in &spec.records {
        log_entry(entry);
    }
    log_page_footer(&spec);
    Ok(())
}

fn log_entry(entry: &LogEntry) {
    let level = format!("{:<5}", entry.level.as_str());
    let level = match entry.level {
        LogLevel::Fatal | LogLevel::Error => level.if_supports_color(Stdout, |t| t.red()).to_string(),
        LogLevel::Warn => level.if_supports_color(Stdout, |t| t.yellow()).to_string(),
        LogLevel::Info => level,
        LogLevel::Debug | LogLevel::Trace => {
            level.if_supports_color(Stdout, |t| t.dimmed()).to_string()
        }
    };
    log::info!(
        "{} {} {:<24} {}",
        format_time(&entry.time).if_supports_color(Stdout, |t| t.dimmed()),
        level,
        truncate_str(&entry.logger, 24),
        entry.message
    );
    if let Some(exception) = &entry.exception {
        let kind = entry.exception_type.as_deref().unwrap_or("Exception");
        log::info!("    {}: {}", kind, exception);
    }
}
