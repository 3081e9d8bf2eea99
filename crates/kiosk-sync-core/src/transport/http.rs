//! HTTP client for the survey server's voting endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ServerId, SubmissionRequest, SubmitError, SubmitResult, VotingSubmitter};
use crate::util::{compact_text, normalize_server_address, normalize_text_option};
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Clone)]
pub struct HttpVotingSubmitter {
    base_url: String,
    username: String,
    access_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpVotingSubmitter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpVotingSubmitter")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("access_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpVotingSubmitter {
    pub fn new(
        server_address: &str,
        username: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self> {
        let base_url = normalize_server_address(server_address).ok_or_else(|| {
            Error::InvalidInput("server address must not be empty".to_string())
        })?;
        let username = normalize_text_option(Some(username.into()))
            .ok_or_else(|| Error::InvalidInput("username must not be empty".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::Http(error.to_string()))?;

        Ok(Self {
            base_url,
            username,
            access_key: access_key.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn votings_url(&self, survey_id: &str) -> String {
        format!("{}/surveys/{survey_id}/votings", self.base_url)
    }

    async fn send(&self, request: SubmissionRequest<'_>) -> SubmitResult<ServerId> {
        let response = self
            .client
            .post(self.votings_url(request.survey_id))
            .basic_auth(&self.username, Some(&self.access_key))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(IDEMPOTENCY_HEADER, request.job_id.as_str())
            .json(request.voting)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        let payload = response
            .json::<CreatedVoting>()
            .await
            .map_err(|error| SubmitError::InvalidResponse(error.to_string()))?;
        Ok(ServerId(payload.id))
    }
}

#[async_trait]
impl VotingSubmitter for HttpVotingSubmitter {
    async fn submit(
        &self,
        request: SubmissionRequest<'_>,
        cancel: CancellationToken,
    ) -> SubmitResult<ServerId> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SubmitError::Cancelled),
            result = self.send(request) => result,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedVoting {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn map_transport_error(error: reqwest::Error) -> SubmitError {
    if error.is_timeout() {
        SubmitError::Timeout
    } else {
        SubmitError::Transport(error.to_string())
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
