//! Data models for kiosk-sync

mod job;
mod paging;
mod voting;

pub use job::{FailState, JobId, PendingJob, QueueCounts, SyncedRecord};
pub use paging::{Page, DEFAULT_PER_PAGE};
pub use voting::{Vote, Voting};
