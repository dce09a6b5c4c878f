//! reelvault CLI
//!
//! Command-line interface for inspecting and maintaining a movie library
//! database.

mod cli_types;
mod commands;
mod error;

use std::io::Write;

use clap::Parser;
use env_logger::{Env, Target};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use cli_types::{Cli, Commands, CommandsAction, ConfigAction, WantedAction};
pub(crate) use error::CliError;
use reelvault_lib::Settings;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".if_supports_color(Stderr, |t| t.red()), e);
        std::process::exit(1);
    }
}

/// Plain messages at info level; level tags and timestamps with `--verbose`.
fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.target(Target::Stdout);
    if verbose {
        builder.format_timestamp_millis();
    } else {
        builder.format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        });
    }
    builder.init();
}

/// Print an empty line through the logger so it interleaves with messages.
pub(crate) fn log_blank() {
    log::info!("");
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;

    match cli.command {
        Commands::Init { save } => commands::init::run_init(&settings, cli.db, save),
        Commands::Wanted { action } => match action {
            WantedAction::Cutoff { page, unmonitored } => {
                commands::wanted::run_wanted_cutoff(&settings, cli.db, &page, unmonitored)
            }
            WantedAction::Missing { page, unmonitored } => {
                commands::wanted::run_wanted_missing(&settings, cli.db, &page, unmonitored)
            }
        },
        Commands::Commands { action } => match action {
            CommandsAction::List { name, active } => {
                commands::tasks::run_commands_list(&settings, cli.db, name, active)
            }
            CommandsAction::Recover => commands::tasks::run_commands_recover(&settings, cli.db),
            CommandsAction::Trim => commands::tasks::run_commands_trim(&settings, cli.db),
        },
        Commands::Logs { level, page } => commands::logs::run_logs(&settings, cli.db, level, &page),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(&settings, cli.db),
            ConfigAction::Path => commands::config::run_config_path(),
        },
    }
}
