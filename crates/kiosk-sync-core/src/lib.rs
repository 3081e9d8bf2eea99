//! kiosk-sync-core - Offline voting sync queue
//!
//! Votings collected on a kiosk are persisted as pending jobs and delivered
//! to the survey server whenever connectivity allows. This crate holds the
//! models, the SQLite job store, the HTTP submitter and the queue engine
//! shared by every kiosk front end.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod transport;
pub mod util;

pub use config::SyncSettings;
pub use db::{JobStore, SqliteJobStore};
pub use error::{Error, Result};
pub use models::{FailState, JobId, PendingJob, SyncedRecord, Vote, Voting};
pub use queue::{EventKind, QueueConfig, QueueEvent, QueueStatus, SyncQueue};
pub use transport::{HttpVotingSubmitter, VotingSubmitter};
