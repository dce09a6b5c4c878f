use std::cmp::Reverse;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_lib::{CommandModel, CommandStatus, RETENTION_HOURS, Settings};

use crate::CliError;

use super::{format_time, open_existing, truncate_str};

pub(crate) fn run_commands_list(
    settings: &Settings,
    db: Option<PathBuf>,
    name: Option<String>,
    active: bool,
) -> Result<(), CliError> {
    let Some(library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let repo = library.commands();
    let mut commands = match (&name, active) {
        (Some(name), true) => repo.find_queued_or_started(name),
        (Some(name), false) => repo.find_commands(name),
        (None, true) => repo
            .queued()
            .and_then(|mut queued| {
                queued.extend(repo.started()?);
                Ok(queued)
            }),
        (None, false) => repo.all(),
    }
    .map_err(|e| CliError::database(format!("Failed to list commands: {}", e)))?;
    commands.sort_by_key(|c| Reverse((c.queued_at, c.id)));

    if commands.is_empty() {
        log::info!("No commands recorded.");
        return Ok(());
    }

    log::info!(
        "  {:>6}  {:<24} {:<10} {:<19}  {:>9}  {}",
        "Id",
        "Name",
        "Status",
        "Queued",
        "Duration",
        "Detail"
    );
    for command in &commands {
        log_command(command);
    }
    crate::log_blank();
    log::info!("{} command(s)", commands.len());
    Ok(())
}

fn log_command(command: &CommandModel) {
    let status = format!("{:<10}", format!("{:?}", command.status));
    let status = match command.status {
        CommandStatus::Completed => status.if_supports_color(Stdout, |t| t.green()).to_string(),
        CommandStatus::Failed | CommandStatus::Orphaned => {
            status.if_supports_color(Stdout, |t| t.red()).to_string()
        }
        CommandStatus::Aborted => status.if_supports_color(Stdout, |t| t.yellow()).to_string(),
        CommandStatus::Queued | CommandStatus::Started => {
            status.if_supports_color(Stdout, |t| t.cyan()).to_string()
        }
    };
    let duration = command
        .duration
        .map(|d| format!("{:.1}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    let detail = command.exception.as_deref().unwrap_or("");

    log::info!(
        "  {:>6}  {:<24} {} {:<19}  {:>9}  {}",
        command.id,
        truncate_str(&command.name, 24),
        status,
        format_time(&command.queued_at),
        duration,
        truncate_str(detail, 60)
    );
}

/// Mark commands left `Started` by a process that is no longer running.
pub(crate) fn run_commands_recover(
    settings: &Settings,
    db: Option<PathBuf>,
) -> Result<(), CliError> {
    let Some(mut library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let orphaned = library
        .recover_interrupted()
        .map_err(|e| CliError::database(format!("Failed to recover commands: {}", e)))?;

    if orphaned == 0 {
        log::info!("No interrupted commands found.");
    } else {
        log::info!(
            "{} Marked {} interrupted command(s) as orphaned",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            orphaned
        );
    }
    Ok(())
}

pub(crate) fn run_commands_trim(settings: &Settings, db: Option<PathBuf>) -> Result<(), CliError> {
    let Some(library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let removed = library
        .commands()
        .trim()
        .map_err(|e| CliError::database(format!("Failed to trim commands: {}", e)))?;

    log::info!(
        "{} Removed {} command(s) that ended more than {} hours ago",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        removed,
        RETENTION_HOURS
    );
    Ok(())
}
