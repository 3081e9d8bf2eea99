use std::path::Path;
use std::time::Duration;

use kiosk_sync_core::SyncSettings;

use crate::commands::common::{open_queue, ProgressReporter};
use crate::commands::sync::sync_once;
use crate::error::CliError;

pub async fn run_foreground(
    period_minutes: Option<u64>,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let (queue, settings) = open_queue(db_path, global_profile)?;
    let period = resolve_period(period_minutes, &settings)?;

    // Deliver the backlog first, then retry on the interval
    sync_once(&queue, true).await?;

    let reporter = ProgressReporter::attach(&queue);
    queue.start_interval(period)?;
    println!(
        "Syncing every {} minute(s); press Ctrl-C to stop",
        period.as_secs() / 60
    );

    tokio::signal::ctrl_c().await?;
    queue.stop_interval()?;
    let summary = reporter.detach(&queue);
    println!(
        "Stopped: {} synced, {} failed",
        summary.succeeded, summary.failed
    );
    Ok(())
}

/// Interval from `--period-minutes`, else from the profile when `auto_sync` is on
pub fn resolve_period(
    period_minutes: Option<u64>,
    settings: &SyncSettings,
) -> Result<Duration, CliError> {
    match period_minutes {
        Some(0) => Err(CliError::Config(
            "sync period must be at least one minute".to_string(),
        )),
        Some(minutes) => Ok(Duration::from_secs(minutes.saturating_mul(60))),
        None => settings.sync_period().ok_or_else(|| {
            CliError::Config(
                "auto_sync is off for this profile; enable it or pass --period-minutes"
                    .to_string(),
            )
        }),
    }
}
