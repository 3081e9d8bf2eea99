//! Failure classification for submission attempts

use crate::models::FailState;
use crate::transport::SubmitError;

/// HTTP status that marks credentials as rejected
const UNAUTHORIZED: u16 = 401;

/// How a failed attempt is recorded on its job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Aborted by `stop`; the job stays eligible for the next initial pass
    Cancelled,
    /// Credentials rejected
    Auth,
    /// Anything else, including timeouts
    Network,
}

impl FailureClass {
    #[must_use]
    pub const fn classify(error: &SubmitError) -> Self {
        if matches!(error, SubmitError::Cancelled) {
            Self::Cancelled
        } else if matches!(error.http_status(), Some(UNAUTHORIZED)) {
            Self::Auth
        } else {
            Self::Network
        }
    }

    /// Persisted fail state, or `None` when the job is left untouched
    #[must_use]
    pub const fn fail_state(self) -> Option<FailState> {
        match self {
            Self::Cancelled => None,
            Self::Auth => Some(FailState::Auth),
            Self::Network => Some(FailState::Network),
        }
    }
}
