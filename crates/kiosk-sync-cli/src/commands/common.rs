use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use kiosk_sync_core::queue::Subscription;
use kiosk_sync_core::{
    EventKind, PendingJob, SqliteJobStore, SyncQueue, SyncSettings, SyncedRecord, Voting,
};
use serde::Serialize;

use crate::config_profiles::CliProfilesConfig;
use crate::credentials::resolve_access_key;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct PendingJobItem {
    pub number: i64,
    pub id: String,
    pub survey_id: String,
    pub status: String,
    pub active: bool,
    pub votes: usize,
    pub created_at: i64,
    pub created_at_iso: String,
}

#[derive(Debug, Serialize)]
pub struct SyncedRecordItem {
    pub number: i64,
    pub id: String,
    pub survey_id: String,
    pub votes: usize,
    pub created_at: i64,
    pub synced_at: i64,
    pub synced_at_iso: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| env::var_os("KIOSK_SYNC_DB_PATH").map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("kiosk-sync").join("queue.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn open_store(path: &Path) -> Result<Arc<SqliteJobStore>, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SqliteJobStore::open(path)?))
}

/// Settings of the resolved profile, with its name
pub fn load_profile_settings(
    global_profile: Option<&str>,
) -> Result<(String, SyncSettings), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let settings = config.profile(&profile_name).cloned().unwrap_or_default();
    Ok((profile_name, settings))
}

pub fn queue_from_settings(
    store: Arc<SqliteJobStore>,
    settings: &SyncSettings,
    access_key: Option<String>,
) -> Result<SyncQueue, CliError> {
    if settings.validate().is_err() {
        return Err(CliError::SyncNotConfigured);
    }
    let Some(access_key) = access_key else {
        return Err(CliError::SyncNotConfigured);
    };

    let submitter = settings.submitter(access_key)?;
    tracing::debug!(server = submitter.base_url(), "Using survey server");
    Ok(SyncQueue::new(
        settings.queue_config(),
        store,
        Arc::new(submitter),
    ))
}

pub fn open_queue(
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(SyncQueue, SyncSettings), CliError> {
    let (profile_name, settings) = load_profile_settings(global_profile)?;
    let access_key = resolve_access_key(&profile_name)?;
    let store = open_store(db_path)?;
    let queue = queue_from_settings(store, &settings, access_key)?;
    tracing::info!("Using profile '{}'", profile_name);
    Ok((queue, settings))
}

pub fn normalize_survey_id(survey_id: &str) -> Result<String, CliError> {
    let trimmed = survey_id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySurveyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_voting_input(file: Option<&Path>) -> Result<Voting, CliError> {
    let raw = match file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => read_piped_stdin()?,
    };
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Err(CliError::EmptyVoting);
    };
    Ok(Voting::from_json(&raw)?)
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Counts delivery outcomes while attached to a queue
pub struct ProgressReporter {
    succeeded: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressReporter {
    pub fn attach(queue: &SyncQueue) -> Self {
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&succeeded);
        let on_success = queue.register_callback(EventKind::SyncJobSuccess, move |event| {
            counter.fetch_add(1, Ordering::Relaxed);
            if let Some(job) = event.job() {
                println!("synced  {}  survey={}", job.job_id, job.voting.survey);
            }
        });

        let counter = Arc::clone(&failed);
        let on_failure = queue.register_callback(EventKind::SyncJobFailure, move |event| {
            counter.fetch_add(1, Ordering::Relaxed);
            if let Some(job) = event.job() {
                println!("failed  {}  survey={}", job.job_id, job.voting.survey);
            }
        });

        Self {
            succeeded,
            failed,
            subscriptions: vec![on_success, on_failure],
        }
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn detach(self, queue: &SyncQueue) -> SyncSummary {
        for subscription in &self.subscriptions {
            queue.unregister_callback(subscription);
        }
        self.summary()
    }
}

pub fn pending_job_to_item(job: &PendingJob) -> PendingJobItem {
    PendingJobItem {
        number: job.number,
        id: job.id.to_string(),
        survey_id: job.survey_id.clone(),
        status: job_status(job).to_string(),
        active: job.active,
        votes: job.voting.votes.len(),
        created_at: job.created_at,
        created_at_iso: format_timestamp(job.created_at),
    }
}

pub fn synced_record_to_item(record: &SyncedRecord) -> SyncedRecordItem {
    SyncedRecordItem {
        number: record.number,
        id: record.id.to_string(),
        survey_id: record.survey_id.clone(),
        votes: record.voting.votes.len(),
        created_at: record.created_at,
        synced_at: record.synced_at,
        synced_at_iso: format_timestamp(record.synced_at),
    }
}

pub const fn job_status(job: &PendingJob) -> &'static str {
    if job.active {
        "syncing"
    } else {
        job.status_label()
    }
}

pub fn format_pending_lines(jobs: &[PendingJob]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    jobs.iter()
        .map(|job| {
            let number = format!("#{}", job.number);
            let short_id = short_id(&job.id.to_string());
            format!(
                "{number:<6}  {short_id:<13}  {:<16}  {:<24}  {}",
                job.survey_id,
                job_status(job),
                format_relative_time(job.created_at, now_ms)
            )
        })
        .collect()
}

pub fn format_synced_lines(records: &[SyncedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let number = format!("#{}", record.number);
            let short_id = short_id(&record.id.to_string());
            format!(
                "{number:<6}  {short_id:<13}  {:<16}  synced {}",
                record.survey_id,
                format_timestamp(record.synced_at)
            )
        })
        .collect()
}

fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}
