//! Sync queue configuration

use std::time::Duration;

/// Default number of simultaneous submissions
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Configuration for the sync queue engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of jobs in flight at once (at least 1)
    pub concurrency: usize,
    /// Per-job deadline; an expired job counts as a network failure
    pub timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

impl QueueConfig {
    /// Set the concurrency window
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-job deadline
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-job deadline in milliseconds; 0 disables it
    #[must_use]
    pub const fn with_timeout_millis(mut self, timeout_ms: u64) -> Self {
        self.timeout = if timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms))
        };
        self
    }
}
