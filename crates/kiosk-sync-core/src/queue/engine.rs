//! Sync queue engine: job selection, bounded dispatch, cancellation, interval retry

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::events::{EventKind, EventRegistry, JobEventPayload, QueueEvent, Subscription};
use super::{FailureClass, QueueConfig};
use crate::db::{JobStore, SelectionMode};
use crate::models::{PendingJob, Voting};
use crate::transport::{ServerId, SubmissionRequest, SubmitError, SubmitResult, VotingSubmitter};
use crate::util::unix_millis_now;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Inactive,
    Active,
}

struct RunState {
    status: QueueStatus,
    /// Incremented by every start; a pass only acts while it owns the current run
    run: u64,
    /// Parent of every in-flight submission token of the current run
    cancel: CancellationToken,
}

struct Inner {
    config: QueueConfig,
    store: Arc<dyn JobStore>,
    submitter: Arc<dyn VotingSubmitter>,
    events: EventRegistry,
    state: Mutex<RunState>,
    interval: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the offline sync queue.
///
/// Construct one at application startup and clone it into every consumer.
/// Clones share the same engine.
#[derive(Clone)]
pub struct SyncQueue {
    inner: Arc<Inner>,
}

impl SyncQueue {
    pub fn new(
        config: QueueConfig,
        store: Arc<dyn JobStore>,
        submitter: Arc<dyn VotingSubmitter>,
    ) -> Self {
        tracing::debug!(
            concurrency = config.concurrency,
            timeout = ?config.timeout,
            "Initializing sync queue"
        );
        Self {
            inner: Arc::new(Inner {
                config: config.with_concurrency(config.concurrency),
                store,
                submitter,
                events: EventRegistry::new(),
                state: Mutex::new(RunState {
                    status: QueueStatus::Inactive,
                    run: 0,
                    cancel: CancellationToken::new(),
                }),
                interval: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.inner.store
    }

    pub fn status(&self) -> QueueStatus {
        self.inner.state.lock().status
    }

    pub fn is_active(&self) -> bool {
        self.status() == QueueStatus::Active
    }

    pub fn register_callback<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.inner.events.register(kind, handler)
    }

    pub fn unregister_callback(&self, subscription: &Subscription) -> bool {
        self.inner.events.unregister(subscription)
    }

    /// Queue a voting for delivery.
    ///
    /// With `auto_start`, an inactive engine starts a pass in the background
    /// on the current tokio runtime; an active engine is left alone.
    pub fn add_voting(
        &self,
        survey_id: &str,
        voting: &Voting,
        auto_start: bool,
    ) -> Result<PendingJob> {
        let job = self.inner.store.create_job(survey_id, voting)?;
        tracing::debug!(job_id = %job.id, number = job.number, "Queued voting");

        if auto_start && !self.is_active() {
            match Handle::try_current() {
                Ok(handle) => self.spawn_pass(&handle, false),
                Err(_) => {
                    tracing::warn!(job_id = %job.id, "No async runtime; voting stays queued");
                }
            }
        }

        Ok(job)
    }

    /// Run one sync pass until no eligible job remains, then stop.
    ///
    /// Returns immediately when the engine is already active. With
    /// `retry_failed`, jobs that failed earlier become eligible again.
    /// Store errors end the pass, stop the engine, and are returned.
    pub async fn start(&self, retry_failed: bool) -> Result<()> {
        let Some((run, cancel)) = self.begin_run() else {
            return Ok(());
        };

        tracing::info!(retry_failed, "Sync queue started");
        self.inner.events.emit(&QueueEvent::QueueStart);

        let result = self.run_pass(run, &cancel, retry_failed).await;
        let stopped = self.stop_run(Some(run));
        result.and(stopped)
    }

    /// Stop the engine, cancel in-flight submissions and release their jobs.
    ///
    /// Always emits `QueueStop`, even when already inactive.
    pub fn stop(&self) -> Result<()> {
        self.stop_run(None)
    }

    /// Trigger a retry pass every `period`, replacing any running interval
    pub fn start_interval(&self, period: Duration) -> Result<()> {
        if period.is_zero() {
            return Err(Error::InvalidInput(
                "sync interval must be greater than zero".to_string(),
            ));
        }
        let handle = Handle::try_current()
            .map_err(|error| Error::InvalidInput(format!("sync interval needs a runtime: {error}")))?;

        let queue = Arc::downgrade(&self.inner);
        let task = handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = queue.upgrade() else {
                    break;
                };
                let queue = Self { inner };
                queue.spawn_pass(&Handle::current(), true);
            }
        });

        if let Some(previous) = self.inner.interval.lock().replace(task) {
            previous.abort();
        }
        tracing::info!(?period, "Started sync interval");
        Ok(())
    }

    /// Cancel the recurring retry pass and stop the engine
    pub fn stop_interval(&self) -> Result<()> {
        if let Some(task) = self.inner.interval.lock().take() {
            task.abort();
            tracing::info!("Stopped sync interval");
        }
        self.stop()
    }

    /// Delete every pending job and synced record.
    ///
    /// An active engine is stopped first.
    pub fn flush_queue(&self) -> Result<()> {
        if self.is_active() {
            self.stop()?;
        }
        self.inner.store.flush()?;
        tracing::info!("Flushed sync queue");
        Ok(())
    }

    fn spawn_pass(&self, handle: &Handle, retry_failed: bool) {
        let queue = self.clone();
        handle.spawn(async move {
            if let Err(error) = queue.start(retry_failed).await {
                tracing::error!("Sync pass failed: {error}");
            }
        });
    }

    fn begin_run(&self) -> Option<(u64, CancellationToken)> {
        let mut state = self.inner.state.lock();
        if state.status == QueueStatus::Active {
            return None;
        }
        state.status = QueueStatus::Active;
        state.run += 1;
        state.cancel = CancellationToken::new();
        Some((state.run, state.cancel.clone()))
    }

    fn stop_run(&self, only_run: Option<u64>) -> Result<()> {
        let released = {
            let mut state = self.inner.state.lock();
            if let Some(run) = only_run {
                if state.status != QueueStatus::Active || state.run != run {
                    // Stopped externally; that stop already emitted
                    return Ok(());
                }
            }
            state.status = QueueStatus::Inactive;
            std::mem::take(&mut state.cancel).cancel();
            self.inner.store.release_active()
        };

        tracing::info!("Sync queue stopped");
        self.inner.events.emit(&QueueEvent::QueueStop);

        let released = released?;
        if released > 0 {
            tracing::debug!(released, "Released interrupted sync jobs");
        }
        Ok(())
    }

    async fn run_pass(
        &self,
        run: u64,
        cancel: &CancellationToken,
        retry_failed: bool,
    ) -> Result<()> {
        if retry_failed {
            let cleared = self.inner.store.clear_failed_in_scope()?;
            tracing::debug!(cleared, "Reset failed jobs for retry pass");
        }

        let mode = SelectionMode::from_retry(retry_failed);
        loop {
            // Selection happens under the state lock so a concurrent stop
            // either precedes it or releases what it marked active
            let batch = {
                let state = self.inner.state.lock();
                if state.status != QueueStatus::Active || state.run != run {
                    break;
                }
                self.inner
                    .store
                    .select_batch(mode, self.inner.config.concurrency)?
            };
            if batch.is_empty() {
                break;
            }

            tracing::debug!(jobs = batch.len(), "Dispatching sync batch");
            let outcomes = join_all(
                batch
                    .into_iter()
                    .map(|job| self.process_job(job, cancel.child_token())),
            )
            .await;
            for outcome in outcomes {
                outcome?;
            }
        }

        Ok(())
    }

    async fn process_job(&self, job: PendingJob, cancel: CancellationToken) -> Result<()> {
        let payload = JobEventPayload {
            job_id: job.id,
            voting: job.voting.clone(),
        };
        tracing::debug!(job_id = %job.id, number = job.number, "Sync job started");
        self.inner
            .events
            .emit(&QueueEvent::SyncJobStart(payload.clone()));

        match self.submit(&job, cancel.clone()).await {
            Ok(ServerId(server_id)) => {
                if self
                    .inner
                    .store
                    .promote(&job.id, unix_millis_now())?
                    .is_none()
                {
                    tracing::warn!(job_id = %job.id, "Delivered job was removed before it was recorded");
                }
                tracing::debug!(job_id = %job.id, %server_id, "Sync job succeeded");
                self.inner.events.emit(&QueueEvent::SyncJobSuccess(payload));
            }
            Err(error) => {
                // Once stopped, any late error counts as cancellation; the
                // job may already belong to a newer pass
                let class = if cancel.is_cancelled() {
                    FailureClass::Cancelled
                } else {
                    FailureClass::classify(&error)
                };
                match class.fail_state() {
                    Some(fail_state) => {
                        tracing::warn!(job_id = %job.id, %fail_state, "Sync job failed: {error}");
                        if !self.inner.store.mark_failed(&job.id, fail_state)? {
                            tracing::debug!(job_id = %job.id, "Failed job was no longer in flight");
                        }
                    }
                    // Cancelled by stop, which already released the job
                    None => tracing::debug!(job_id = %job.id, "Sync job cancelled"),
                }
                self.inner.events.emit(&QueueEvent::SyncJobFailure(payload));
            }
        }

        Ok(())
    }

    async fn submit(&self, job: &PendingJob, cancel: CancellationToken) -> SubmitResult<ServerId> {
        let request = SubmissionRequest {
            job_id: job.id,
            survey_id: &job.survey_id,
            voting: &job.voting,
        };
        let submission = self.inner.submitter.submit(request, cancel);

        match self.inner.config.timeout {
            Some(deadline) => tokio::time::timeout(deadline, submission)
                .await
                .unwrap_or_else(|_| Err(SubmitError::Timeout)),
            None => submission.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteJobStore;
    use crate::models::{FailState, Vote};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::{mpsc, Notify};

    const ALL_KINDS: [EventKind; 5] = [
        EventKind::QueueStart,
        EventKind::QueueStop,
        EventKind::SyncJobStart,
        EventKind::SyncJobSuccess,
        EventKind::SyncJobFailure,
    ];

    /// Outcome is chosen by survey id: `auth` answers 401, `network` 503,
    /// `hang` never answers, anything else succeeds. The first `late-reset`
    /// call ignores cancellation and fails after 50 ms; later ones hang.
    #[derive(Default)]
    struct FakeSubmitter {
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        offline: AtomicBool,
        started: Notify,
    }

    impl FakeSubmitter {
        fn calls_for(&self, survey_id: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|call| call.as_str() == survey_id)
                .count()
        }

        async fn respond(&self, survey_id: &str) -> SubmitResult<ServerId> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.offline.load(Ordering::SeqCst) {
                return Err(SubmitError::Transport("connection refused".to_string()));
            }
            match survey_id {
                "auth" => Err(SubmitError::Status {
                    status: 401,
                    message: "unauthorized".to_string(),
                }),
                "network" => Err(SubmitError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
                "hang" | "late-reset" => std::future::pending().await,
                other => Ok(ServerId(format!("srv-{other}"))),
            }
        }
    }

    #[async_trait]
    impl VotingSubmitter for FakeSubmitter {
        async fn submit(
            &self,
            request: SubmissionRequest<'_>,
            cancel: CancellationToken,
        ) -> SubmitResult<ServerId> {
            self.calls.lock().push(request.survey_id.to_string());
            let attempt = self.calls_for(request.survey_id);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.started.notify_one();

            let result = if request.survey_id == "late-reset" && attempt == 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(SubmitError::Transport("reset".to_string()))
            } else {
                tokio::select! {
                    () = cancel.cancelled() => Err(SubmitError::Cancelled),
                    result = self.respond(request.survey_id) => result,
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    struct Harness {
        queue: SyncQueue,
        store: Arc<SqliteJobStore>,
        submitter: Arc<FakeSubmitter>,
        events: Arc<Mutex<Vec<EventKind>>>,
    }

    impl Harness {
        fn new(config: QueueConfig) -> Self {
            let store = Arc::new(SqliteJobStore::open_in_memory().unwrap());
            let submitter = Arc::new(FakeSubmitter::default());
            let queue = SyncQueue::new(config, store.clone(), submitter.clone());

            let events = Arc::new(Mutex::new(Vec::new()));
            for kind in ALL_KINDS {
                let events = Arc::clone(&events);
                queue.register_callback(kind, move |event| events.lock().push(event.kind()));
            }

            Self {
                queue,
                store,
                submitter,
                events,
            }
        }

        fn add(&self, survey_id: &str) -> PendingJob {
            self.queue
                .add_voting(survey_id, &voting(survey_id), false)
                .unwrap()
        }

        fn count(&self, kind: EventKind) -> usize {
            self.events.lock().iter().filter(|seen| **seen == kind).count()
        }

        fn stop_signal(&self) -> mpsc::UnboundedReceiver<()> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.queue.register_callback(EventKind::QueueStop, move |_| {
                let _ = tx.send(());
            });
            rx
        }
    }

    fn voting(survey_id: &str) -> Voting {
        Voting::new(survey_id, vec![Vote::new("q1", "a1"), Vote::new("q2", "a2")])
    }

    #[tokio::test]
    async fn batches_respect_concurrency_window() {
        let harness = Harness::new(QueueConfig::default().with_concurrency(2));
        for survey in ["s1", "s2", "s3"] {
            harness.add(survey);
        }

        harness.queue.start(false).await.unwrap();

        let counts = harness.store.counts().unwrap();
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.synced, 3);
        assert_eq!(harness.submitter.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(*harness.submitter.calls.lock(), vec!["s1", "s2", "s3"]);

        // Second batch only starts after the whole first batch settled
        let events = harness.events.lock().clone();
        assert_eq!(
            events,
            vec![
                EventKind::QueueStart,
                EventKind::SyncJobStart,
                EventKind::SyncJobStart,
                EventKind::SyncJobSuccess,
                EventKind::SyncJobSuccess,
                EventKind::SyncJobStart,
                EventKind::SyncJobSuccess,
                EventKind::QueueStop,
            ]
        );
        assert_eq!(harness.queue.status(), QueueStatus::Inactive);
    }

    #[tokio::test]
    async fn synced_records_keep_job_identity() {
        let harness = Harness::new(QueueConfig::default());
        let job = harness.add("s1");

        harness.queue.start(false).await.unwrap();

        let synced = harness.store.list_synced(10, 0).unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].id, job.id);
        assert_eq!(synced[0].number, job.number);
        assert_eq!(synced[0].voting, job.voting);
        assert!(synced[0].synced_at >= job.created_at);
    }

    #[tokio::test]
    async fn unauthorized_job_stays_pending_as_auth_failure() {
        let harness = Harness::new(QueueConfig::default());
        let job = harness.add("auth");

        harness.queue.start(false).await.unwrap();

        let stored = harness.store.get_job(&job.id).unwrap().unwrap();
        assert_eq!(stored.fail_state, FailState::Auth);
        assert!(stored.failed_in_scope);
        assert!(!stored.active);
        assert_eq!(harness.count(EventKind::SyncJobFailure), 1);
        assert_eq!(harness.store.counts().unwrap().synced, 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_block_siblings() {
        let harness = Harness::new(QueueConfig::default());
        let failing = harness.add("network");
        harness.add("s1");
        harness.add("s2");

        harness.queue.start(false).await.unwrap();

        let counts = harness.store.counts().unwrap();
        assert_eq!(counts.synced, 2);
        assert_eq!(counts.failed_network, 1);
        let stored = harness.store.get_job(&failing.id).unwrap().unwrap();
        assert_eq!(stored.fail_state, FailState::Network);
    }

    #[tokio::test]
    async fn failed_jobs_wait_for_retry_pass() {
        let harness = Harness::new(QueueConfig::default());
        harness.submitter.offline.store(true, Ordering::SeqCst);
        let first = harness.add("s1");
        let second = harness.add("s2");

        harness.queue.start(false).await.unwrap();
        assert_eq!(harness.submitter.calls.lock().len(), 2);

        // Back online, but an initial pass does not pick failed jobs up
        harness.submitter.offline.store(false, Ordering::SeqCst);
        harness.queue.start(false).await.unwrap();
        assert_eq!(harness.submitter.calls.lock().len(), 2);
        assert_eq!(harness.store.counts().unwrap().failed_network, 2);

        harness.queue.start(true).await.unwrap();
        assert_eq!(harness.submitter.calls.lock().len(), 4);
        assert!(harness.store.get_job(&first.id).unwrap().is_none());
        assert!(harness.store.get_job(&second.id).unwrap().is_none());
        assert_eq!(harness.store.counts().unwrap().synced, 2);
    }

    #[tokio::test]
    async fn retry_pass_attempts_failed_job_once() {
        let harness = Harness::new(QueueConfig::default());
        let job = harness.add("network");

        harness.queue.start(false).await.unwrap();
        harness.queue.start(true).await.unwrap();

        // Failing again inside the retry pass keeps it out of reselection
        assert_eq!(harness.submitter.calls_for("network"), 2);
        let stored = harness.store.get_job(&job.id).unwrap().unwrap();
        assert!(stored.failed_in_scope);
        assert_eq!(stored.fail_state, FailState::Network);
    }

    #[tokio::test]
    async fn stop_cancels_in_flight_job_without_failing_it() {
        let harness = Harness::new(QueueConfig::default());
        let job = harness.add("hang");

        let queue = harness.queue.clone();
        let pass = tokio::spawn(async move { queue.start(false).await });
        harness.submitter.started.notified().await;
        assert!(harness.queue.is_active());

        harness.queue.stop().unwrap();
        pass.await.unwrap().unwrap();

        let stored = harness.store.get_job(&job.id).unwrap().unwrap();
        assert_eq!(stored.fail_state, FailState::None);
        assert!(!stored.active);
        assert!(!stored.failed_in_scope);
        assert_eq!(harness.count(EventKind::SyncJobFailure), 1);
        assert_eq!(harness.count(EventKind::QueueStart), 1);
        assert_eq!(harness.count(EventKind::QueueStop), 1);

        // Eligible for the very next initial pass
        let next = harness
            .store
            .select_batch(SelectionMode::Initial, 5)
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, job.id);
    }

    #[tokio::test]
    async fn late_error_from_stopped_pass_keeps_job_with_new_pass() {
        let harness = Harness::new(QueueConfig::default());
        let job = harness.add("late-reset");

        let queue = harness.queue.clone();
        let first = tokio::spawn(async move { queue.start(false).await });
        harness.submitter.started.notified().await;
        harness.queue.stop().unwrap();

        let queue = harness.queue.clone();
        let second = tokio::spawn(async move { queue.start(false).await });
        harness.submitter.started.notified().await;

        // The stopped pass receives its transport error while the new one
        // still owns the job
        first.await.unwrap().unwrap();

        assert!(harness.queue.is_active());
        assert_eq!(harness.submitter.calls_for("late-reset"), 2);
        let stored = harness.store.get_job(&job.id).unwrap().unwrap();
        assert!(stored.active);
        assert_eq!(stored.fail_state, FailState::None);
        assert!(!stored.failed_in_scope);

        harness.queue.stop().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(harness.count(EventKind::QueueStart), 2);
        assert_eq!(harness.count(EventKind::QueueStop), 2);
    }

    #[tokio::test]
    async fn timeout_counts_as_network_failure() {
        let harness = Harness::new(QueueConfig::default().with_timeout_millis(20));
        let job = harness.add("hang");

        harness.queue.start(false).await.unwrap();

        let stored = harness.store.get_job(&job.id).unwrap().unwrap();
        assert_eq!(stored.fail_state, FailState::Network);
        assert!(stored.failed_in_scope);
        assert!(!stored.active);
    }

    #[tokio::test]
    async fn add_voting_auto_starts_inactive_queue() {
        let harness = Harness::new(QueueConfig::default());
        let mut stopped = harness.stop_signal();

        harness
            .queue
            .add_voting("s1", &voting("s1"), true)
            .unwrap();
        stopped.recv().await.unwrap();

        assert_eq!(harness.store.counts().unwrap().synced, 1);
        assert_eq!(harness.count(EventKind::QueueStart), 1);
    }

    #[tokio::test]
    async fn add_voting_while_active_does_not_restart() {
        let harness = Harness::new(QueueConfig::default());
        let mut stopped = harness.stop_signal();

        harness
            .queue
            .add_voting("hang", &voting("hang"), true)
            .unwrap();
        harness.submitter.started.notified().await;

        harness
            .queue
            .add_voting("s1", &voting("s1"), true)
            .unwrap();
        assert_eq!(harness.count(EventKind::QueueStart), 1);

        harness.queue.stop().unwrap();
        stopped.recv().await.unwrap();
        assert_eq!(harness.count(EventKind::QueueStart), 1);
    }

    #[tokio::test]
    async fn add_voting_without_auto_start_stays_idle() {
        let harness = Harness::new(QueueConfig::default());
        let first = harness.add("s1");
        let second = harness.add("s2");

        assert_eq!((first.number, second.number), (1, 2));
        assert!(!harness.queue.is_active());
        assert!(harness.events.lock().is_empty());
    }

    #[tokio::test]
    async fn start_is_noop_while_active() {
        let harness = Harness::new(QueueConfig::default());
        harness.add("hang");

        let queue = harness.queue.clone();
        let pass = tokio::spawn(async move { queue.start(false).await });
        harness.submitter.started.notified().await;

        harness.queue.start(true).await.unwrap();
        assert_eq!(harness.count(EventKind::QueueStart), 1);

        harness.queue.stop().unwrap();
        pass.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_pass_emits_start_and_stop() {
        let harness = Harness::new(QueueConfig::default());

        harness.queue.start(false).await.unwrap();

        assert_eq!(
            *harness.events.lock(),
            vec![EventKind::QueueStart, EventKind::QueueStop]
        );
    }

    #[tokio::test]
    async fn stop_when_inactive_still_notifies() {
        let harness = Harness::new(QueueConfig::default());

        harness.queue.stop().unwrap();

        assert_eq!(harness.count(EventKind::QueueStop), 1);
        assert_eq!(harness.count(EventKind::QueueStart), 0);
    }

    #[tokio::test]
    async fn flush_queue_clears_pending_and_synced() {
        let harness = Harness::new(QueueConfig::default());
        harness.add("s1");
        harness.queue.start(false).await.unwrap();
        harness.add("auth");
        harness.queue.start(false).await.unwrap();
        harness.add("s2");

        harness.queue.flush_queue().unwrap();

        assert_eq!(
            harness.store.counts().unwrap(),
            crate::models::QueueCounts::default()
        );
    }

    #[tokio::test]
    async fn unregistered_callback_is_not_called() {
        let harness = Harness::new(QueueConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = harness
            .queue
            .register_callback(EventKind::QueueStart, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        harness.queue.start(false).await.unwrap();
        assert!(harness.queue.unregister_callback(&subscription));
        harness.queue.start(false).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_runs_retry_passes() {
        let harness = Harness::new(QueueConfig::default());
        let mut stopped = harness.stop_signal();
        harness.submitter.offline.store(true, Ordering::SeqCst);
        harness.add("s1");
        harness.queue.start(false).await.unwrap();
        stopped.recv().await.unwrap();
        assert_eq!(harness.store.counts().unwrap().failed_network, 1);

        harness.submitter.offline.store(false, Ordering::SeqCst);
        harness
            .queue
            .start_interval(Duration::from_secs(60))
            .unwrap();
        stopped.recv().await.unwrap();

        assert_eq!(harness.store.counts().unwrap().synced, 1);

        harness.queue.stop_interval().unwrap();
        assert!(!harness.queue.is_active());
        assert!(harness.queue.inner.interval.lock().is_none());
    }

    #[tokio::test]
    async fn start_interval_rejects_zero_period() {
        let harness = Harness::new(QueueConfig::default());
        assert!(harness.queue.start_interval(Duration::ZERO).is_err());
    }
}
