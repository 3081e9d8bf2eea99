use std::path::Path;

use kiosk_sync_core::SyncQueue;

use crate::commands::common::{open_queue, ProgressReporter, SyncSummary};
use crate::error::CliError;

pub async fn run_sync(
    retry_failed: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let (queue, _) = open_queue(db_path, global_profile)?;
    let summary = sync_once(&queue, retry_failed).await?;

    let counts = queue.store().counts()?;
    println!(
        "Sync finished: {} synced, {} failed, {} still pending",
        summary.succeeded, summary.failed, counts.pending
    );
    Ok(())
}

/// One pass with progress output
pub async fn sync_once(queue: &SyncQueue, retry_failed: bool) -> Result<SyncSummary, CliError> {
    let reporter = ProgressReporter::attach(queue);
    let result = queue.start(retry_failed).await;
    let summary = reporter.detach(queue);
    result?;
    Ok(summary)
}
