use std::sync::Arc;

use async_trait::async_trait;
use kiosk_sync_core::models::FailState;
use kiosk_sync_core::transport::{ServerId, SubmissionRequest, SubmitError, SubmitResult};
use kiosk_sync_core::{
    JobStore, PendingJob, QueueConfig, SqliteJobStore, SyncQueue, SyncSettings, Vote, Voting,
    VotingSubmitter,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use crate::cli::CompletionShell;
use crate::commands::add::{add_and_sync, run_add, sync_after_add};
use crate::commands::common::{
    format_pending_lines, format_relative_time, format_timestamp, job_status,
    normalize_survey_id, open_store, queue_from_settings, read_voting_input, SyncSummary,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{apply_profile_update, ProfileUpdate};
use crate::commands::flush::{flush_votings, run_flush};
use crate::commands::list::run_list;
use crate::commands::run::resolve_period;
use crate::commands::status::run_status;
use crate::commands::sync::sync_once;
use crate::error::CliError;

const VOTING_JSON: &str = r#"{
    "survey": "lobby",
    "date": "2024-05-01T09:30:00Z",
    "votes": [
        {"question": "q1", "answerOption": "a2"},
        {"question": "q2", "answerOption": "a1"}
    ]
}"#;

/// Accepts every survey except `locked`, which answers 401, and `slow`,
/// which only resolves once cancelled
struct FakeServer;

#[async_trait]
impl VotingSubmitter for FakeServer {
    async fn submit(
        &self,
        request: SubmissionRequest<'_>,
        cancel: CancellationToken,
    ) -> SubmitResult<ServerId> {
        match request.survey_id {
            "locked" => Err(SubmitError::Status {
                status: 401,
                message: "unauthorized".to_string(),
            }),
            "slow" => {
                cancel.cancelled().await;
                Err(SubmitError::Cancelled)
            }
            _ => Ok(ServerId(format!("srv-{}", request.job_id))),
        }
    }
}

fn fake_queue(store: &Arc<SqliteJobStore>) -> SyncQueue {
    SyncQueue::new(
        QueueConfig::default().with_concurrency(2),
        store.clone(),
        Arc::new(FakeServer),
    )
}

fn configured_settings() -> SyncSettings {
    SyncSettings {
        server_address: Some("survey.example.com".to_string()),
        username: Some("kiosk-7".to_string()),
        ..SyncSettings::default()
    }
}

#[test]
fn normalize_survey_id_trims_and_rejects_empty() {
    assert_eq!(normalize_survey_id("  lobby ").unwrap(), "lobby");
    assert!(matches!(
        normalize_survey_id(" \n "),
        Err(CliError::EmptySurveyId)
    ));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn read_voting_input_parses_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voting.json");
    std::fs::write(&path, VOTING_JSON).unwrap();

    let voting = read_voting_input(Some(&path)).unwrap();
    assert_eq!(voting.survey, "lobby");
    assert_eq!(voting.votes, vec![Vote::new("q1", "a2"), Vote::new("q2", "a1")]);
}

#[test]
fn read_voting_input_rejects_blank_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, "  \n").unwrap();

    assert!(matches!(
        read_voting_input(Some(&path)),
        Err(CliError::EmptyVoting)
    ));
}

#[test]
fn job_status_shows_in_flight_and_failure_labels() {
    let mut job = PendingJob::new(3, "lobby", Voting::new("lobby", Vec::new()));
    assert_eq!(job_status(&job), "sync pending");

    job.fail_state = FailState::Auth;
    assert_eq!(job_status(&job), "authentication error");

    job.active = true;
    assert_eq!(job_status(&job), "syncing");

    let lines = format_pending_lines(&[job]);
    assert!(lines[0].starts_with("#3"));
    assert!(lines[0].contains("lobby"));
}

#[test]
fn resolve_period_prefers_flag_and_rejects_zero() {
    let settings = SyncSettings {
        auto_sync: true,
        ..configured_settings()
    };
    assert_eq!(resolve_period(Some(2), &settings).unwrap().as_secs(), 120);
    assert_eq!(resolve_period(None, &settings).unwrap().as_secs(), 300);
    assert!(resolve_period(Some(0), &settings).is_err());
}

#[test]
fn resolve_period_requires_auto_sync_without_flag() {
    let settings = configured_settings();
    assert!(!settings.auto_sync);

    assert!(matches!(
        resolve_period(None, &settings),
        Err(CliError::Config(_))
    ));
    assert_eq!(resolve_period(Some(1), &settings).unwrap().as_secs(), 60);
}

#[test]
fn add_syncs_when_flag_or_auto_sync_is_set() {
    let manual = configured_settings();
    let automatic = SyncSettings {
        auto_sync: true,
        ..configured_settings()
    };

    assert!(!sync_after_add(false, &manual));
    assert!(sync_after_add(true, &manual));
    assert!(sync_after_add(false, &automatic));
}

#[tokio::test(flavor = "current_thread")]
async fn add_and_sync_delivers_the_new_voting() {
    let store = Arc::new(SqliteJobStore::open_in_memory().unwrap());
    let queue = fake_queue(&store);
    let voting = Voting::new("lobby", vec![Vote::new("q1", "a1")]);

    let (job, summary) = add_and_sync(&queue, "lobby", &voting).await.unwrap();

    assert_eq!(job.number, 1);
    assert_eq!(
        summary,
        SyncSummary {
            succeeded: 1,
            failed: 0
        }
    );
    assert!(store.get_job(&job.id).unwrap().is_none());
    assert_eq!(store.list_synced(10, 0).unwrap()[0].id, job.id);
}

#[test]
fn apply_profile_update_merges_explicit_values() {
    let existing = configured_settings();
    let updated = apply_profile_update(
        existing,
        ProfileUpdate {
            username: Some("  ".to_string()),
            auto_sync: Some(true),
            concurrency: Some(2),
            ..ProfileUpdate::default()
        },
    )
    .unwrap();

    assert_eq!(
        updated.server_address.as_deref(),
        Some("https://survey.example.com")
    );
    assert_eq!(updated.username.as_deref(), Some("kiosk-7"));
    assert!(updated.auto_sync);
    assert_eq!(updated.concurrency, 2);
}

#[test]
fn apply_profile_update_rejects_invalid_values() {
    let non_http = ProfileUpdate {
        server_address: Some("ftp://survey.example.com".to_string()),
        ..ProfileUpdate::default()
    };
    assert!(apply_profile_update(SyncSettings::default(), non_http).is_err());

    let zero_period = ProfileUpdate {
        sync_period_minutes: Some(0),
        ..ProfileUpdate::default()
    };
    assert!(apply_profile_update(SyncSettings::default(), zero_period).is_err());
}

#[test]
fn queue_requires_settings_and_access_key() {
    let store = Arc::new(SqliteJobStore::open_in_memory().unwrap());

    assert!(matches!(
        queue_from_settings(Arc::clone(&store), &SyncSettings::default(), Some("key".into())),
        Err(CliError::SyncNotConfigured)
    ));
    assert!(matches!(
        queue_from_settings(Arc::clone(&store), &configured_settings(), None),
        Err(CliError::SyncNotConfigured)
    ));

    let queue = queue_from_settings(store, &configured_settings(), Some("key".into())).unwrap();
    assert_eq!(queue.config().concurrency, 5);
}

#[tokio::test(flavor = "current_thread")]
async fn add_list_status_and_flush_against_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("queue.db");
    let voting_path = dir.path().join("voting.json");
    std::fs::write(&voting_path, VOTING_JSON).unwrap();

    run_add("lobby", Some(&voting_path), false, &db_path, None)
        .await
        .unwrap();
    run_add("lobby", Some(&voting_path), false, &db_path, None)
        .await
        .unwrap();

    let store = open_store(&db_path).unwrap();
    let jobs = store.list_pending(10, 0).unwrap();
    assert_eq!(
        jobs.iter().map(|job| job.number).collect::<Vec<_>>(),
        vec![2, 1]
    );

    run_list(false, 1, 25, false, &db_path).unwrap();
    run_list(true, 4, 25, true, &db_path).unwrap();
    run_status(true, &db_path).unwrap();

    assert!(matches!(
        run_flush(false, &db_path, None),
        Err(CliError::FlushNotConfirmed)
    ));
    assert_eq!(store.counts().unwrap().pending, 2);

    run_flush(true, &db_path, None).unwrap();
    assert_eq!(store.counts().unwrap().pending, 0);
}

#[tokio::test(flavor = "current_thread")]
async fn flush_stops_active_queue_before_deleting() {
    let store = Arc::new(SqliteJobStore::open_in_memory().unwrap());
    let queue = fake_queue(&store);
    let voting = Voting::new("lobby", vec![Vote::new("q1", "a1")]);
    queue.add_voting("lobby", &voting, false).unwrap();
    queue.start(false).await.unwrap();
    queue.add_voting("slow", &voting, false).unwrap();

    let pass = tokio::spawn({
        let queue = queue.clone();
        async move { queue.start(false).await }
    });
    while store.counts().unwrap().active == 0 {
        tokio::task::yield_now().await;
    }

    let counts = flush_votings(&store, Some(&queue)).unwrap();
    pass.await.unwrap().unwrap();

    assert_eq!((counts.pending, counts.synced), (1, 1));
    assert!(!queue.is_active());
    let after = store.counts().unwrap();
    assert_eq!((after.pending, after.synced), (0, 0));
}

#[tokio::test(flavor = "current_thread")]
async fn sync_once_reports_outcomes() {
    let store = Arc::new(SqliteJobStore::open_in_memory().unwrap());
    let queue = fake_queue(&store);
    let voting = Voting::new("lobby", vec![Vote::new("q1", "a1")]);
    for survey in ["lobby", "locked", "entrance"] {
        queue.add_voting(survey, &voting, false).unwrap();
    }

    let summary = sync_once(&queue, false).await.unwrap();

    assert_eq!(
        summary,
        SyncSummary {
            succeeded: 2,
            failed: 1
        }
    );
    let counts = store.counts().unwrap();
    assert_eq!(counts.synced, 2);
    assert_eq!(counts.failed_auth, 1);

    // Reporter handlers are removed after the pass
    let again = sync_once(&queue, false).await.unwrap();
    assert_eq!(again, SyncSummary::default());
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("kiosk-sync"));
}
