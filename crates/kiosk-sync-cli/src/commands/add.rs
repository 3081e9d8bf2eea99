use std::path::Path;
use std::sync::Arc;

use kiosk_sync_core::{JobStore, PendingJob, SyncQueue, SyncSettings, Voting};

use crate::commands::common::{
    load_profile_settings, normalize_survey_id, open_store, queue_from_settings,
    read_voting_input, ProgressReporter, SyncSummary,
};
use crate::credentials::resolve_access_key;
use crate::error::CliError;

pub async fn run_add(
    survey_id: &str,
    file: Option<&Path>,
    sync: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let survey_id = normalize_survey_id(survey_id)?;
    let voting = read_voting_input(file)?;
    let (profile_name, settings) = load_profile_settings(global_profile)?;
    let store = open_store(db_path)?;

    let queue = if sync_after_add(sync, &settings) {
        let access_key = resolve_access_key(&profile_name)?;
        match queue_from_settings(Arc::clone(&store), &settings, access_key) {
            Ok(queue) => Some(queue),
            // auto_sync alone never blocks queuing
            Err(CliError::SyncNotConfigured) if !sync => {
                tracing::warn!(
                    "Profile '{}' has auto_sync on but cannot sync yet; voting stays queued",
                    profile_name
                );
                None
            }
            Err(error) => return Err(error),
        }
    } else {
        None
    };

    let Some(queue) = queue else {
        let job = store.create_job(&survey_id, &voting)?;
        println!("#{}  {}", job.number, job.id);
        return Ok(());
    };

    let (job, summary) = add_and_sync(&queue, &survey_id, &voting).await?;
    println!("#{}  {}", job.number, job.id);
    println!(
        "Sync finished: {} synced, {} failed",
        summary.succeeded, summary.failed
    );
    Ok(())
}

/// Whether `add` runs a pass after queuing
pub const fn sync_after_add(sync: bool, settings: &SyncSettings) -> bool {
    sync || settings.auto_sync
}

/// Queue the voting and run one pass over the queue
pub async fn add_and_sync(
    queue: &SyncQueue,
    survey_id: &str,
    voting: &Voting,
) -> Result<(PendingJob, SyncSummary), CliError> {
    let job = queue.add_voting(survey_id, voting, false)?;

    let reporter = ProgressReporter::attach(queue);
    let result = queue.start(false).await;
    let summary = reporter.detach(queue);
    result?;

    Ok((job, summary))
}
