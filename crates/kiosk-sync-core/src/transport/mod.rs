//! Remote submission of votings.

mod http;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::{JobId, Voting};

pub use http::HttpVotingSubmitter;

/// Identifier the remote authority assigned to an accepted voting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerId(pub String);

/// One delivery attempt
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    /// Sent as the idempotency key so a resent voting is recognisable
    pub job_id: JobId,
    pub survey_id: &'a str,
    pub voting: &'a Voting,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submission cancelled")]
    Cancelled,
    #[error("Submission timed out")]
    Timeout,
    #[error("Server rejected voting: {message}")]
    Status { status: u16, message: String },
    #[error("Submission transport failed: {0}")]
    Transport(String),
    #[error("Invalid submission response: {0}")]
    InvalidResponse(String),
}

impl SubmitError {
    /// HTTP status of the server response, if one was received
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Delivers votings to the remote authority.
///
/// Implementations must resolve with [`SubmitError::Cancelled`] once `cancel`
/// fires, without waiting for the remote side.
#[async_trait]
pub trait VotingSubmitter: Send + Sync {
    async fn submit(
        &self,
        request: SubmissionRequest<'_>,
        cancel: CancellationToken,
    ) -> SubmitResult<ServerId>;
}
