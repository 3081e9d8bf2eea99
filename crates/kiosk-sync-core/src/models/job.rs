//! Sync job and synced record models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Voting;

/// A unique identifier for a sync job, using UUID v7 (time-sortable)
///
/// A synced record keeps the id of the job it was promoted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new unique job ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Classified failure of the last delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailState {
    /// Never failed, or the failure was cleared
    #[default]
    #[serde(rename = "")]
    None,
    /// Transport failure, timeout, or any non-401 server response
    Network,
    /// Server rejected the credentials (HTTP 401)
    Auth,
}

impl FailState {
    /// Persisted representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Network => "network",
            Self::Auth => "auth",
        }
    }

    #[must_use]
    pub const fn is_failed(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Operator-facing description of a job in this state
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "sync pending",
            Self::Network => "server connection error",
            Self::Auth => "authentication error",
        }
    }
}

impl fmt::Display for FailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailState {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "network" => Ok(Self::Network),
            "auth" => Ok(Self::Auth),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown fail state '{other}'"
            ))),
        }
    }
}

/// A voting durably queued for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingJob {
    /// Unique identifier
    pub id: JobId,
    /// Human-facing sequence number, unique across pending and synced
    pub number: i64,
    /// Set while a delivery attempt is in flight
    pub active: bool,
    /// Creation timestamp (Unix ms), the dispatch ordering key
    pub created_at: i64,
    /// Failure of the last attempt
    pub fail_state: FailState,
    /// Failed during the current retry scope
    pub failed_in_scope: bool,
    /// Survey this response belongs to
    pub survey_id: String,
    /// Response content
    pub voting: Voting,
}

impl PendingJob {
    /// Create a new, never attempted job with the given sequence number
    #[must_use]
    pub fn new(number: i64, survey_id: impl Into<String>, voting: Voting) -> Self {
        Self {
            id: JobId::new(),
            number,
            active: false,
            created_at: chrono::Utc::now().timestamp_millis(),
            fail_state: FailState::None,
            failed_in_scope: false,
            survey_id: survey_id.into(),
            voting,
        }
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        self.fail_state.label()
    }

    /// Terminal record for this job after a successful delivery
    #[must_use]
    pub fn into_synced(self, synced_at: i64) -> SyncedRecord {
        SyncedRecord {
            id: self.id,
            number: self.number,
            created_at: self.created_at,
            synced_at,
            survey_id: self.survey_id,
            voting: self.voting,
        }
    }
}

/// A successfully delivered voting, kept for local history until a flush
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedRecord {
    /// Id of the originating job
    pub id: JobId,
    /// Sequence number of the originating job
    pub number: i64,
    /// Creation timestamp of the originating job (Unix ms)
    pub created_at: i64,
    /// Delivery timestamp (Unix ms)
    pub synced_at: i64,
    /// Survey this response belongs to
    pub survey_id: String,
    /// Response content
    pub voting: Voting,
}

/// Queue overview counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// All pending jobs, failed or not
    pub pending: usize,
    /// Pending jobs whose last attempt failed with a network error
    pub failed_network: usize,
    /// Pending jobs whose last attempt was rejected as unauthorized
    pub failed_auth: usize,
    /// Pending jobs currently in flight
    pub active: usize,
    /// Delivered records
    pub synced: usize,
}
