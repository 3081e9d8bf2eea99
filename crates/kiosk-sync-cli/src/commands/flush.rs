use std::path::Path;
use std::sync::Arc;

use kiosk_sync_core::models::QueueCounts;
use kiosk_sync_core::{JobStore, SqliteJobStore, SyncQueue};

use crate::commands::common::{load_profile_settings, open_store, queue_from_settings};
use crate::credentials::resolve_access_key;
use crate::error::CliError;

pub fn run_flush(
    confirmed: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::FlushNotConfirmed);
    }

    let (profile_name, settings) = load_profile_settings(global_profile)?;
    let store = open_store(db_path)?;
    let queue = match queue_from_settings(
        Arc::clone(&store),
        &settings,
        resolve_access_key(&profile_name)?,
    ) {
        Ok(queue) => Some(queue),
        Err(CliError::SyncNotConfigured) => None,
        Err(error) => return Err(error),
    };

    let counts = flush_votings(&store, queue.as_ref())?;
    println!(
        "Flushed {} pending and {} synced votings",
        counts.pending, counts.synced
    );
    Ok(())
}

/// Delete every voting, through the queue engine when one is configured
pub fn flush_votings(
    store: &SqliteJobStore,
    queue: Option<&SyncQueue>,
) -> Result<QueueCounts, CliError> {
    let counts = store.counts()?;
    match queue {
        Some(queue) => queue.flush_queue()?,
        None => store.flush()?,
    }
    Ok(counts)
}
