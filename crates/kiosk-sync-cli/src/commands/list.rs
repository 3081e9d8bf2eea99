use std::path::Path;

use kiosk_sync_core::models::Page;
use kiosk_sync_core::JobStore;

use crate::commands::common::{
    format_pending_lines, format_synced_lines, open_store, pending_job_to_item,
    synced_record_to_item, PendingJobItem, SyncedRecordItem,
};
use crate::error::CliError;

pub fn run_list(
    synced: bool,
    page: usize,
    per_page: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let counts = store.counts()?;
    let total = if synced { counts.synced } else { counts.pending };
    let window = Page::resolve(per_page, page, total);

    let lines = if synced {
        let records = store.list_synced(window.per_page, window.offset)?;
        if as_json {
            let items = records
                .iter()
                .map(synced_record_to_item)
                .collect::<Vec<SyncedRecordItem>>();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        format_synced_lines(&records)
    } else {
        let jobs = store.list_pending(window.per_page, window.offset)?;
        if as_json {
            let items = jobs
                .iter()
                .map(pending_job_to_item)
                .collect::<Vec<PendingJobItem>>();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        format_pending_lines(&jobs)
    };

    if lines.is_empty() {
        println!(
            "No {} votings.",
            if synced { "synced" } else { "pending" }
        );
        return Ok(());
    }

    println!(
        "Page {}/{} ({} total)",
        window.page, window.last_page, window.count
    );
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
