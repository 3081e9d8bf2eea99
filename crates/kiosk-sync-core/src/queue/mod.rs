//! Offline sync queue
//!
//! Jobs are selected from the store in creation order, submitted in batches
//! no larger than the concurrency window, and either promoted to synced
//! records or marked failed. Failed jobs are skipped until a retry pass.

mod config;
mod engine;
mod events;
mod failure;

pub use config::{QueueConfig, DEFAULT_CONCURRENCY};
pub use engine::{QueueStatus, SyncQueue};
pub use events::{EventKind, EventRegistry, JobEventPayload, QueueEvent, Subscription};
pub use failure::FailureClass;
