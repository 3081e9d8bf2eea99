use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] kiosk_sync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Survey ID cannot be empty")]
    EmptySurveyId,
    #[error("No voting provided; pass --file or pipe voting JSON on stdin")]
    EmptyVoting,
    #[error("No access key provided; pass --access-key or pipe it on stdin")]
    EmptyAccessKey,
    #[error("Flush deletes every queued and synced voting; rerun with --yes to confirm")]
    FlushNotConfirmed,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Credential storage error: {0}")]
    Credentials(String),
    #[error(
        "Sync is not configured. Run `kiosk-sync config init --server-address <URL> --username <NAME>` and `kiosk-sync config set-access-key`, or set KIOSK_SYNC_ACCESS_KEY."
    )]
    SyncNotConfigured,
}
