use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kiosk_sync_core::models::DEFAULT_PER_PAGE;

#[derive(Parser)]
#[command(name = "kiosk-sync")]
#[command(about = "Queue kiosk votings offline and deliver them to the survey server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local queue database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name holding server settings
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a voting for delivery
    Add {
        /// Survey the voting belongs to
        survey_id: String,
        /// Voting JSON file (stdin when omitted)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Deliver pending votings right away
        #[arg(long)]
        sync: bool,
    },
    /// Run one sync pass over the queue
    Sync {
        /// Also retry jobs whose last attempt failed
        #[arg(long)]
        retry_failed: bool,
    },
    /// Keep syncing in the foreground until interrupted
    Run {
        /// Minutes between retry passes (profile setting when omitted)
        #[arg(long, value_name = "MINUTES")]
        period_minutes: Option<u64>,
    },
    /// List queued or synced votings, newest first
    List {
        /// Show delivered votings instead of pending ones
        #[arg(long)]
        synced: bool,
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Votings per page
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show queue counters
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every queued and synced voting
    Flush {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile settings
    Init {
        /// Survey server address; `https://` is assumed without a scheme
        #[arg(long, value_name = "URL")]
        server_address: Option<String>,
        /// Kiosk username on the survey server
        #[arg(long, value_name = "NAME")]
        username: Option<String>,
        /// Enable periodic retry passes
        #[arg(long, value_name = "BOOL")]
        auto_sync: Option<bool>,
        /// Minutes between retry passes
        #[arg(long, value_name = "MINUTES")]
        sync_period_minutes: Option<u64>,
        /// Maximum simultaneous submissions
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Per-submission deadline in milliseconds, 0 for none
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show profile settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store the access key in the OS keychain
    SetAccessKey {
        /// Access key (stdin when omitted)
        #[arg(long, value_name = "KEY")]
        access_key: Option<String>,
    },
    /// Remove the stored access key
    ClearAccessKey,
}
