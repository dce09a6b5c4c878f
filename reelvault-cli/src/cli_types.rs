//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reelvault")]
#[command(about = "Inspect and maintain a movie library database", long_about = None)]
pub(crate) struct Cli {
    /// Library database file (defaults to settings.toml, then the data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Paging arguments shared by every listing.
#[derive(Args, Clone, Debug)]
pub(crate) struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Records per page, 0 for everything (default from settings.toml)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Column to sort by, optionally qualified (e.g., title, movie_files.size)
    #[arg(long)]
    pub sort_key: Option<String>,

    /// Sort in descending order
    #[arg(long)]
    pub descending: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create the library database, or migrate an existing one
    Init {
        /// Remember this database in settings.toml
        #[arg(long)]
        save: bool,
    },

    /// List movies that still need a download or an upgrade
    Wanted {
        #[command(subcommand)]
        action: WantedAction,
    },

    /// Inspect and maintain background command records
    Commands {
        #[command(subcommand)]
        action: CommandsAction,
    },

    /// Browse stored log entries
    Logs {
        /// Minimum level to show (trace, debug, info, warn, error, fatal)
        #[arg(short, long)]
        level: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum WantedAction {
    /// Movies whose file is missing or below the profile cutoff
    Cutoff {
        #[command(flatten)]
        page: PageArgs,

        /// List unmonitored movies instead of monitored ones
        #[arg(long)]
        unmonitored: bool,
    },

    /// Movies without any file
    Missing {
        #[command(flatten)]
        page: PageArgs,

        /// List unmonitored movies instead of monitored ones
        #[arg(long)]
        unmonitored: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum CommandsAction {
    /// List recorded commands, newest first
    List {
        /// Only commands with this name (e.g., RefreshMovie)
        #[arg(long)]
        name: Option<String>,

        /// Only queued or running commands
        #[arg(long)]
        active: bool,
    },

    /// Mark commands left running by a previous process as orphaned
    Recover,

    /// Delete commands that ended more than 24 hours ago
    Trim,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the effective settings and where they come from
    Show,

    /// Print the settings file path
    Path,
}
