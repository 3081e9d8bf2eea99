//! kiosk-sync CLI - Queue kiosk votings and deliver them when online

mod cli;
mod commands;
mod config_profiles;
mod credentials;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::flush::run_flush;
use crate::commands::list::run_list;
use crate::commands::run::run_foreground;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Add {
            survey_id,
            file,
            sync,
        } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_add(&survey_id, file.as_deref(), sync, &db_path, profile).await?;
        }
        Commands::Sync { retry_failed } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_sync(retry_failed, &db_path, profile).await?;
        }
        Commands::Run { period_minutes } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_foreground(period_minutes, &db_path, profile).await?;
        }
        Commands::List {
            synced,
            page,
            per_page,
            json,
        } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_list(synced, page, per_page, json, &db_path)?;
        }
        Commands::Status { json } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_status(json, &db_path)?;
        }
        Commands::Flush { yes } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_flush(yes, &db_path, profile)?;
        }
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "kiosk_sync=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
