//! Sync job repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension, Row, Transaction};

use super::Database;
use crate::error::Result;
use crate::models::{FailState, JobId, PendingJob, QueueCounts, SyncedRecord, Voting};

const JOB_COLUMNS: &str =
    "id, number, active, created_at, fail_state, failed_in_scope, survey_id, voting";
const SYNCED_COLUMNS: &str = "id, number, created_at, synced_at, survey_id, voting";

/// Which jobs a selection considers eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Inactive jobs that have not failed
    Initial,
    /// Inactive jobs that have not failed in the current retry scope
    Retry,
}

impl SelectionMode {
    #[must_use]
    pub const fn from_retry(retry_failed: bool) -> Self {
        if retry_failed {
            Self::Retry
        } else {
            Self::Initial
        }
    }

    const fn filter(self) -> &'static str {
        match self {
            Self::Initial => "active = 0 AND fail_state = ''",
            Self::Retry => "active = 0 AND failed_in_scope = 0",
        }
    }
}

/// Durable storage for pending jobs and synced records.
///
/// Every method runs as a single atomic transaction.
pub trait JobStore: Send + Sync {
    /// Create a pending job with the next free sequence number
    fn create_job(&self, survey_id: &str, voting: &Voting) -> Result<PendingJob>;

    /// Select up to `limit` eligible jobs, oldest first, and mark them active
    /// with their fail state cleared
    fn select_batch(&self, mode: SelectionMode, limit: usize) -> Result<Vec<PendingJob>>;

    /// Clear the failed-in-scope flag on every job that has it; returns the count
    fn clear_failed_in_scope(&self) -> Result<usize>;

    /// Replace a pending job by its synced record.
    ///
    /// Returns `None` when the job no longer exists.
    fn promote(&self, id: &JobId, synced_at: i64) -> Result<Option<SyncedRecord>>;

    /// Record a classified failure; returns `false` when the job no longer exists
    fn mark_failed(&self, id: &JobId, fail_state: FailState) -> Result<bool>;

    /// Reset `active` on every job that has it; returns the count
    fn release_active(&self) -> Result<usize>;

    /// Delete all pending jobs and synced records
    fn flush(&self) -> Result<()>;

    /// Get a pending job by ID
    fn get_job(&self, id: &JobId) -> Result<Option<PendingJob>>;

    /// List pending jobs, highest sequence number first
    fn list_pending(&self, limit: usize, offset: usize) -> Result<Vec<PendingJob>>;

    /// List synced records, highest sequence number first
    fn list_synced(&self, limit: usize, offset: usize) -> Result<Vec<SyncedRecord>>;

    /// Overview counters
    fn counts(&self) -> Result<QueueCounts>;
}

/// `SQLite` implementation of `JobStore`
pub struct SqliteJobStore {
    db: Mutex<Database>,
}

impl SqliteJobStore {
    /// Create a store over an opened database
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open (or create) the store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Parse a pending job from a database row
    fn parse_job(row: &Row<'_>) -> rusqlite::Result<PendingJob> {
        let id: String = row.get(0)?;
        let fail_state: String = row.get(4)?;
        let voting: String = row.get(7)?;
        Ok(PendingJob {
            id: id.parse().map_err(|error| conversion_error(0, error))?,
            number: row.get(1)?,
            active: row.get(2)?,
            created_at: row.get(3)?,
            fail_state: fail_state
                .parse()
                .map_err(|error| conversion_error(4, error))?,
            failed_in_scope: row.get(5)?,
            survey_id: row.get(6)?,
            voting: serde_json::from_str(&voting).map_err(|error| conversion_error(7, error))?,
        })
    }

    /// Parse a synced record from a database row
    fn parse_synced(row: &Row<'_>) -> rusqlite::Result<SyncedRecord> {
        let id: String = row.get(0)?;
        let voting: String = row.get(5)?;
        Ok(SyncedRecord {
            id: id.parse().map_err(|error| conversion_error(0, error))?,
            number: row.get(1)?,
            created_at: row.get(2)?,
            synced_at: row.get(3)?,
            survey_id: row.get(4)?,
            voting: serde_json::from_str(&voting).map_err(|error| conversion_error(5, error))?,
        })
    }

    fn find_job(tx: &Transaction<'_>, id: &JobId) -> Result<Option<PendingJob>> {
        let job = tx
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM sync_jobs WHERE id = ?"),
                params![id.as_str()],
                Self::parse_job,
            )
            .optional()?;
        Ok(job)
    }
}

fn conversion_error(
    index: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(error))
}

fn count_from(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

impl JobStore for SqliteJobStore {
    fn create_job(&self, survey_id: &str, voting: &Voting) -> Result<PendingJob> {
        let voting_json = voting.to_json()?;
        let mut db = self.db.lock();
        let tx = db.connection_mut().transaction()?;

        let next_number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM (
                SELECT number FROM sync_jobs
                UNION ALL
                SELECT number FROM synced_votings
            )",
            [],
            |row| row.get(0),
        )?;

        let job = PendingJob::new(next_number, survey_id, voting.clone());
        tx.execute(
            &format!("INSERT INTO sync_jobs ({JOB_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                job.id.as_str(),
                job.number,
                job.active,
                job.created_at,
                job.fail_state.as_str(),
                job.failed_in_scope,
                job.survey_id,
                voting_json
            ],
        )?;
        tx.commit()?;

        Ok(job)
    }

    fn select_batch(&self, mode: SelectionMode, limit: usize) -> Result<Vec<PendingJob>> {
        let mut db = self.db.lock();
        let tx = db.connection_mut().transaction()?;

        let mut jobs = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {JOB_COLUMNS}
                 FROM sync_jobs
                 WHERE {}
                 ORDER BY created_at ASC, number ASC
                 LIMIT ?",
                mode.filter()
            ))?;
            let rows = stmt
                .query_map(params![limit as i64], Self::parse_job)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        for job in &mut jobs {
            tx.execute(
                "UPDATE sync_jobs SET active = 1, fail_state = '' WHERE id = ?",
                params![job.id.as_str()],
            )?;
            job.active = true;
            job.fail_state = FailState::None;
        }
        tx.commit()?;

        Ok(jobs)
    }

    fn clear_failed_in_scope(&self) -> Result<usize> {
        let db = self.db.lock();
        let rows = db.connection().execute(
            "UPDATE sync_jobs SET failed_in_scope = 0 WHERE failed_in_scope != 0",
            [],
        )?;
        Ok(rows)
    }

    fn promote(&self, id: &JobId, synced_at: i64) -> Result<Option<SyncedRecord>> {
        let mut db = self.db.lock();
        let tx = db.connection_mut().transaction()?;

        let Some(job) = Self::find_job(&tx, id)? else {
            return Ok(None);
        };

        let voting_json = job.voting.to_json()?;
        let record = job.into_synced(synced_at);
        tx.execute(
            &format!("INSERT INTO synced_votings ({SYNCED_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
            params![
                record.id.as_str(),
                record.number,
                record.created_at,
                record.synced_at,
                record.survey_id,
                voting_json
            ],
        )?;
        tx.execute(
            "DELETE FROM sync_jobs WHERE id = ?",
            params![record.id.as_str()],
        )?;
        tx.commit()?;

        Ok(Some(record))
    }

    fn mark_failed(&self, id: &JobId, fail_state: FailState) -> Result<bool> {
        let db = self.db.lock();
        let rows = db.connection().execute(
            "UPDATE sync_jobs SET active = 0, fail_state = ?, failed_in_scope = 1
             WHERE id = ? AND active = 1",
            params![fail_state.as_str(), id.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn release_active(&self) -> Result<usize> {
        let db = self.db.lock();
        let rows = db
            .connection()
            .execute("UPDATE sync_jobs SET active = 0 WHERE active != 0", [])?;
        Ok(rows)
    }

    fn flush(&self) -> Result<()> {
        let mut db = self.db.lock();
        let tx = db.connection_mut().transaction()?;
        tx.execute("DELETE FROM sync_jobs", [])?;
        tx.execute("DELETE FROM synced_votings", [])?;
        tx.commit()?;
        Ok(())
    }

    fn get_job(&self, id: &JobId) -> Result<Option<PendingJob>> {
        let db = self.db.lock();
        let job = db
            .connection()
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM sync_jobs WHERE id = ?"),
                params![id.as_str()],
                Self::parse_job,
            )
            .optional()?;
        Ok(job)
    }

    fn list_pending(&self, limit: usize, offset: usize) -> Result<Vec<PendingJob>> {
        let db = self.db.lock();
        let mut stmt = db.connection().prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM sync_jobs ORDER BY number DESC LIMIT ? OFFSET ?"
        ))?;

        let jobs = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(jobs)
    }

    fn list_synced(&self, limit: usize, offset: usize) -> Result<Vec<SyncedRecord>> {
        let db = self.db.lock();
        let mut stmt = db.connection().prepare(&format!(
            "SELECT {SYNCED_COLUMNS} FROM synced_votings ORDER BY number DESC LIMIT ? OFFSET ?"
        ))?;

        let records = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_synced)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn counts(&self) -> Result<QueueCounts> {
        let db = self.db.lock();
        let conn = db.connection();

        let (pending, failed_network, failed_auth, active) = conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(fail_state = 'network'), 0),
                COALESCE(SUM(fail_state = 'auth'), 0),
                COALESCE(SUM(active != 0), 0)
             FROM sync_jobs",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;
        let synced: i64 =
            conn.query_row("SELECT COUNT(*) FROM synced_votings", [], |row| row.get(0))?;

        Ok(QueueCounts {
            pending: count_from(pending),
            failed_network: count_from(failed_network),
            failed_auth: count_from(failed_auth),
            active: count_from(active),
            synced: count_from(synced),
        })
    }
}
