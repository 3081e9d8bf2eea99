use std::path::Path;

use kiosk_sync_core::JobStore;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let counts = open_store(db_path)?.counts()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    println!("pending:         {}", counts.pending);
    println!("  network error: {}", counts.failed_network);
    println!("  auth error:    {}", counts.failed_auth);
    println!("  in flight:     {}", counts.active);
    println!("synced:          {}", counts.synced);
    Ok(())
}
