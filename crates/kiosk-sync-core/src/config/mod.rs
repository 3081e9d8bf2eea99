//! Device sync settings.
//!
//! `SyncSettings` holds what the kiosk operator configures: where votings are
//! delivered, who the kiosk authenticates as, and how the queue behaves.
//! The access key is a secret and is never part of these settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::queue::{QueueConfig, DEFAULT_CONCURRENCY};
use crate::transport::HttpVotingSubmitter;
use crate::util::{is_http_url, normalize_server_address, normalize_text_option};
use crate::{Error, Result};

const DEFAULT_SYNC_PERIOD_MINUTES: u64 = 5;
const MILLIS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub server_address: Option<String>,
    pub username: Option<String>,
    /// Run a retry pass every `sync_period_minutes`
    pub auto_sync: bool,
    pub sync_period_minutes: u64,
    pub concurrency: usize,
    /// Per-job deadline in milliseconds; 0 disables it
    pub timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            server_address: None,
            username: None,
            auto_sync: false,
            sync_period_minutes: DEFAULT_SYNC_PERIOD_MINUTES,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: 0,
        }
    }
}

impl SyncSettings {
    /// Trim text fields, dropping empty ones, and canonicalize the server address
    #[must_use]
    pub fn normalize(mut self) -> Self {
        self.server_address = normalize_text_option(self.server_address)
            .and_then(|address| normalize_server_address(&address));
        self.username = normalize_text_option(self.username);
        self.concurrency = self.concurrency.max(1);
        self
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::default()
            .with_concurrency(self.concurrency)
            .with_timeout_millis(self.timeout_ms)
    }

    /// Interval between automatic retry passes; `None` when disabled
    pub fn sync_period(&self) -> Option<Duration> {
        if !self.auto_sync || self.sync_period_minutes == 0 {
            return None;
        }
        Some(Duration::from_millis(
            self.sync_period_minutes.saturating_mul(MILLIS_PER_MINUTE),
        ))
    }

    /// Check that a submitter can be built from these settings
    pub fn validate(&self) -> Result<()> {
        let address = normalize_text_option(self.server_address.clone())
            .ok_or_else(|| Error::InvalidInput("server address is not configured".to_string()))?;
        if address.contains("://") && !is_http_url(&address) {
            return Err(Error::InvalidInput(format!(
                "server address must use http(s): {address}"
            )));
        }
        if normalize_text_option(self.username.clone()).is_none() {
            return Err(Error::InvalidInput(
                "username is not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the HTTP submitter for these settings
    pub fn submitter(&self, access_key: impl Into<String>) -> Result<HttpVotingSubmitter> {
        self.validate()?;
        HttpVotingSubmitter::new(
            self.server_address.as_deref().unwrap_or_default(),
            self.username.clone().unwrap_or_default(),
            access_key,
        )
    }
}
