//! Database migrations

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

/// Migration to version 1: pending jobs and synced votings
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Votings waiting for delivery
        "CREATE TABLE IF NOT EXISTS sync_jobs (
            id TEXT PRIMARY KEY,
            number INTEGER NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            fail_state TEXT NOT NULL DEFAULT '',
            failed_in_scope INTEGER NOT NULL DEFAULT 0,
            survey_id TEXT NOT NULL,
            voting TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_jobs_created ON sync_jobs(created_at ASC)",
        "CREATE INDEX IF NOT EXISTS idx_sync_jobs_eligible ON sync_jobs(active, fail_state, failed_in_scope)",
        // Delivered votings, kept until the next survey change
        "CREATE TABLE IF NOT EXISTS synced_votings (
            id TEXT PRIMARY KEY,
            number INTEGER NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            synced_at INTEGER NOT NULL,
            survey_id TEXT NOT NULL,
            voting TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_synced_votings_number ON synced_votings(number DESC)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        tx.execute(stmt, [])?;
    }

    tx.commit()?;

    tracing::info!("Migrated job store to version {CURRENT_VERSION}");
    Ok(())
}
