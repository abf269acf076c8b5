//! Session Coordinator (spec §4.7, C7): the per-interview owner of the
//! in-memory state, the per-interview lock, and the external `execute_step`
//! / `cleanup` API surface (spec §6).
//!
//! One [`SessionCoordinator`] exists per active interview (spec §5
//! "Scheduling model"). Unlike the teacher's `AppRunner`, which owns a
//! process-wide map of sessions and a bulk-synchronous-superstep scheduler,
//! this coordinator owns exactly one interview's state and drives exactly
//! one straight-line [`crate::graph::GraphRuntime`] per input event; the
//! cross-interview fan-out (one coordinator per interview, running
//! concurrently) lives one level up, in whatever holds a
//! `FxHashMap<String, Arc<SessionCoordinator>>` (spec §9 re-architecture:
//! "task-per-interview with channels or per-interview serial queues").

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
use crate::config::Config;
use crate::event_bus::EventHub;
use crate::graph::{GraphError, GraphRuntime};
use crate::records::{ResumeContext, TurnRecord};
use crate::state::InterviewState;

/// `status ∈ {pending, in_progress, completed, cancelled}` (spec §6,
/// interview row accessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    /// Whether the coordinator poll loop should tear this interview down
    /// (spec §4.7 "Cleanup").
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewStatus::Completed | InterviewStatus::Cancelled)
    }
}

/// The one persistent record the core reads when reconstructing minimum
/// state (spec §6 "Interview row accessor"). Writes to this row belong to
/// the HTTP control plane, never to the core.
#[derive(Debug, Clone)]
pub struct InterviewRow {
    pub id: String,
    pub user_id: String,
    pub resume_id: Option<String>,
    pub job_description: Option<String>,
    pub status: InterviewStatus,
    pub conversation_history: Vec<TurnRecord>,
    pub turn_count: u32,
}

/// Read-only access to the interview row (spec §6, external interface 1).
/// The core reads `status` during cleanup polling and the full row when
/// reconstructing state from scratch; it never writes through this trait.
#[async_trait]
pub trait InterviewRowAccessor: Send + Sync {
    async fn load(&self, interview_id: &str) -> Result<Option<InterviewRow>, CoordinatorError>;
    async fn status(&self, interview_id: &str) -> Result<Option<InterviewStatus>, CoordinatorError>;
}

/// Read-only access to a resume (spec §6, external interface 2).
#[async_trait]
pub trait ResumeAccessor: Send + Sync {
    async fn load(&self, resume_id: &str) -> Result<Option<ResumeContext>, CoordinatorError>;
}

/// One external input event (spec §3 "neither" is the timer case, spec
/// §4.3 `ingest_input`: "one of three optional inputs").
#[derive(Debug, Clone)]
pub enum ExternalInput {
    Utterance(String),
    Code { code: String, language: String },
    Timer,
}

impl ExternalInput {
    fn apply(self, state: &mut InterviewState) {
        match self {
            ExternalInput::Utterance(text) => {
                state.control.fields.last_response = Some(text);
            }
            ExternalInput::Code { code, language } => {
                state.control.fields.current_code = Some(code);
                state.control.fields.current_language = Some(language);
            }
            ExternalInput::Timer => {}
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CoordinatorError {
    #[error("graph run failed: {0}")]
    #[diagnostic(code(interview_engine::coordinator::graph_failed))]
    Graph(#[from] GraphError),

    #[error("checkpoint store error: {0}")]
    #[diagnostic(code(interview_engine::coordinator::checkpoint_failed))]
    Checkpoint(#[from] CheckpointError),

    #[error("execute_step exceeded the configured step timeout")]
    #[diagnostic(
        code(interview_engine::coordinator::step_timeout),
        help("in-flight LM/sandbox calls are cancelled; no checkpoint is written")
    )]
    StepTimeout,

    #[error("no interview row found for {interview_id}")]
    #[diagnostic(code(interview_engine::coordinator::interview_not_found))]
    InterviewNotFound { interview_id: String },

    #[error("interview row or resume accessor error: {message}")]
    #[diagnostic(code(interview_engine::coordinator::row_accessor))]
    RowAccessor { message: String },
}

/// What stays behind the per-interview lock: the live state (lazily
/// loaded), the version most recently observed from the checkpoint store,
/// and whether the last write degraded (spec §7 `StorageUnavailable`).
struct Inner {
    state: Option<InterviewState>,
    last_checkpoint_version: Option<u64>,
    unchecked: bool,
}

/// The per-interview owner of state and the execution lock (spec §4.7).
///
/// Cheap to hold behind an `Arc`: all shared collaborators (checkpoint
/// store, row/resume accessors, graph runtime, event hub) are themselves
/// `Arc`-wrapped, so cloning a coordinator handle never deep-copies the
/// LM/sandbox clients (spec §9: explicit dependencies, never global
/// singletons).
pub struct SessionCoordinator {
    interview_id: String,
    config: Config,
    inner: Mutex<Inner>,
    checkpoints: Arc<dyn CheckpointStore>,
    rows: Arc<dyn InterviewRowAccessor>,
    resumes: Arc<dyn ResumeAccessor>,
    runtime: GraphRuntime,
    hub: Arc<EventHub>,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(
        interview_id: impl Into<String>,
        config: Config,
        checkpoints: Arc<dyn CheckpointStore>,
        rows: Arc<dyn InterviewRowAccessor>,
        resumes: Arc<dyn ResumeAccessor>,
        runtime: GraphRuntime,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            interview_id: interview_id.into(),
            config,
            inner: Mutex::new(Inner {
                state: None,
                last_checkpoint_version: None,
                unchecked: false,
            }),
            checkpoints,
            rows,
            resumes,
            runtime,
            hub,
        }
    }

    #[must_use]
    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    /// Whether the most recent run's checkpoint write degraded (spec §7
    /// `StorageUnavailable`): the run completed but was not durably saved.
    pub async fn is_unchecked(&self) -> bool {
        self.inner.lock().await.unchecked
    }

    /// `execute_step(external_input) → assistant_message` (spec §4.7/§6).
    ///
    /// Steps 1-6 of spec §4.7: acquire the lock (the `tokio::sync::Mutex`
    /// guard held for the duration), load-or-reconstruct, apply the
    /// external input as transient fields, run the graph, checkpoint on
    /// success, and only then publish the mutated state back — a failed
    /// run never mutates the coordinator's durable in-memory copy, so two
    /// consecutive failures leave state byte-identical to the last good
    /// checkpoint (spec §7).
    #[tracing::instrument(skip_all, fields(interview_id = %self.interview_id))]
    pub async fn execute_step(&self, input: ExternalInput) -> Result<String, CoordinatorError> {
        match tokio::time::timeout(self.config.step_timeout(), self.execute_step_inner(input)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!("execute_step exceeded the configured step timeout, cancelling in-flight work");
                Err(CoordinatorError::StepTimeout)
            }
        }
    }

    async fn execute_step_inner(&self, input: ExternalInput) -> Result<String, CoordinatorError> {
        let mut guard = self.inner.lock().await;

        if guard.state.is_none() {
            self.load_or_reconstruct(&mut guard).await?;
        }

        // Clone-then-commit: the graph runs on a scratch copy so a failed
        // run never leaves the coordinator's durable in-memory state
        // partially mutated (spec §7 byte-identical-on-failure guarantee).
        let mut working = guard
            .state
            .clone()
            .expect("load_or_reconstruct always populates state on success");
        input.apply(&mut working);

        let outcome = self.runtime.run(&mut working, self.hub.emitter()).await?;

        match self.checkpoints.save(&self.interview_id, &working).await {
            Ok(checkpoint) => {
                guard.last_checkpoint_version = Some(checkpoint.version);
                guard.unchecked = false;
            }
            Err(CheckpointError::Backend { message }) => {
                // `StorageUnavailable` (spec §7): the run still completes
                // and the caller still gets their message; the interview
                // is just flagged as not durably checkpointed.
                tracing::warn!(%message, "checkpoint store unavailable, run completed without a durable checkpoint");
                guard.unchecked = true;
            }
            Err(other) => return Err(other.into()),
        }

        let message = outcome.next_message.unwrap_or_default();
        guard.state = Some(working);
        Ok(message)
    }

    async fn load_or_reconstruct(&self, guard: &mut Inner) -> Result<(), CoordinatorError> {
        match self.checkpoints.load_latest(&self.interview_id).await {
            Ok(Some(checkpoint)) => match self.try_restore(checkpoint) {
                Ok((state, version)) => {
                    guard.state = Some(state);
                    guard.last_checkpoint_version = Some(version);
                    return Ok(());
                }
                Err(_corrupt) => {
                    tracing::warn!(
                        interview_id = %self.interview_id,
                        "checkpoint failed to decode, reconstructing from the interview row"
                    );
                }
            },
            Ok(None) => {}
            Err(CheckpointError::Backend { message }) => {
                tracing::warn!(%message, "checkpoint store unavailable while loading, reconstructing from the interview row");
                guard.unchecked = true;
            }
            Err(other) => return Err(other.into()),
        }

        let state = self.reconstruct_minimum_state().await?;
        guard.state = Some(state);
        guard.last_checkpoint_version = None;
        Ok(())
    }

    fn try_restore(&self, checkpoint: Checkpoint) -> Result<(InterviewState, u64), CheckpointError> {
        let version = checkpoint.version;
        let state = checkpoint.into_state()?;
        Ok((state, version))
    }

    /// Minimum-state reconstruction (spec §4.7 step 2, spec §7
    /// `CorruptStateError` recovery): the interview row's id, user id,
    /// resume, job description, and authoritative conversation history are
    /// the only durable source of truth once no usable checkpoint exists.
    async fn reconstruct_minimum_state(&self) -> Result<InterviewState, CoordinatorError> {
        let row = self
            .rows
            .load(&self.interview_id)
            .await?
            .ok_or_else(|| CoordinatorError::InterviewNotFound {
                interview_id: self.interview_id.clone(),
            })?;

        let mut state = InterviewState::new(row.id.clone());
        state.turns.items = row.conversation_history;
        state.control.fields.turn_count = row.turn_count;

        if let Some(resume_id) = row.resume_id.as_deref() {
            if let Some(resume) = self.resumes.load(resume_id).await? {
                state.control.fields.resume_context = resume;
            }
        }

        Ok(state)
    }

    /// Release the in-memory coordinator state. Never deletes checkpoints
    /// (spec §4.7: "The Coordinator never deletes checkpoints implicitly").
    /// Dropping the coordinator's own `Arc` handles to the shared LM and
    /// sandbox clients happens for free when this coordinator itself is
    /// dropped — those clients are shared pools (spec §5), so there is
    /// nothing process-wide this call could close on their behalf.
    pub async fn cleanup(&self) {
        let mut guard = self.inner.lock().await;
        guard.state = None;
        guard.last_checkpoint_version = None;
        guard.unchecked = false;
    }

    /// Poll the interview row's status on the configured interval (spec
    /// §4.7 "detected via periodic poll of the interview row every 5s")
    /// and clean up once it reaches a terminal status. Intended to be
    /// spawned once per coordinator and aborted alongside it.
    pub async fn run_status_poll(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.status_poll_interval());
        loop {
            ticker.tick().await;
            match self.rows.status(&self.interview_id).await {
                Ok(Some(status)) if status.is_terminal() => {
                    tracing::info!(interview_id = %self.interview_id, ?status, "interview reached a terminal status, cleaning up");
                    self.cleanup().await;
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(interview_id = %self.interview_id, %err, "status poll failed, will retry next tick");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;
    use crate::config::Config;
    use crate::lm::mock::MockLmBackend;
    use crate::lm::LmClient;
    use crate::nodes::NodeRegistry;
    use crate::sandbox::mock::MockSandboxBackend;
    use crate::sandbox::SandboxClient;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeRows {
        rows: StdMutex<rustc_hash::FxHashMap<String, InterviewRow>>,
    }

    impl FakeRows {
        fn insert(&self, row: InterviewRow) {
            self.rows.lock().unwrap().insert(row.id.clone(), row);
        }

        fn set_status(&self, id: &str, status: InterviewStatus) {
            if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
                row.status = status;
            }
        }
    }

    #[async_trait]
    impl InterviewRowAccessor for FakeRows {
        async fn load(&self, interview_id: &str) -> Result<Option<InterviewRow>, CoordinatorError> {
            Ok(self.rows.lock().unwrap().get(interview_id).cloned())
        }

        async fn status(&self, interview_id: &str) -> Result<Option<InterviewStatus>, CoordinatorError> {
            Ok(self.rows.lock().unwrap().get(interview_id).map(|r| r.status))
        }
    }

    #[derive(Default)]
    struct FakeResumes {
        resumes: StdMutex<rustc_hash::FxHashMap<String, ResumeContext>>,
    }

    #[async_trait]
    impl ResumeAccessor for FakeResumes {
        async fn load(&self, resume_id: &str) -> Result<Option<ResumeContext>, CoordinatorError> {
            Ok(self.resumes.lock().unwrap().get(resume_id).cloned())
        }
    }

    fn coordinator(rows: Arc<FakeRows>) -> SessionCoordinator {
        let config = Config::default();
        let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
        let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), &config));
        let runtime = GraphRuntime::new(NodeRegistry::new(lm, sandbox, &config));
        let hub = Arc::new(EventHub::new(64));
        let checkpoints: Arc<dyn CheckpointStore> = Arc::new(InMemoryCheckpointStore::new());
        let resumes: Arc<dyn ResumeAccessor> = Arc::new(FakeResumes::default());
        SessionCoordinator::new("iv-1", config, checkpoints, rows, resumes, runtime, hub)
    }

    fn empty_row(id: &str) -> InterviewRow {
        InterviewRow {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            resume_id: None,
            job_description: None,
            status: InterviewStatus::InProgress,
            conversation_history: Vec::new(),
            turn_count: 0,
        }
    }

    #[tokio::test]
    async fn first_step_reconstructs_from_row_and_greets() {
        let rows = Arc::new(FakeRows::default());
        rows.insert(empty_row("iv-1"));
        let coordinator = coordinator(rows);

        let message = coordinator.execute_step(ExternalInput::Timer).await.unwrap();
        assert!(!message.is_empty());
        assert_eq!(coordinator.inner.lock().await.last_checkpoint_version, Some(1));
    }

    #[tokio::test]
    async fn missing_interview_row_fails_reconstruction() {
        let rows = Arc::new(FakeRows::default());
        let coordinator = coordinator(rows);

        let err = coordinator.execute_step(ExternalInput::Timer).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::InterviewNotFound { .. }));
    }

    #[tokio::test]
    async fn second_step_reuses_in_memory_state_without_reloading() {
        let rows = Arc::new(FakeRows::default());
        rows.insert(empty_row("iv-1"));
        let coordinator = coordinator(rows);

        coordinator.execute_step(ExternalInput::Timer).await.unwrap();
        let reply = coordinator
            .execute_step(ExternalInput::Utterance("I built a recommendation engine".to_string()))
            .await
            .unwrap();
        assert!(!reply.is_empty());
        assert_eq!(coordinator.inner.lock().await.last_checkpoint_version, Some(2));
    }

    #[tokio::test]
    async fn cleanup_clears_in_memory_state_without_deleting_checkpoints() {
        let rows = Arc::new(FakeRows::default());
        rows.insert(empty_row("iv-1"));
        let coordinator = coordinator(rows);

        coordinator.execute_step(ExternalInput::Timer).await.unwrap();
        coordinator.cleanup().await;

        let guard = coordinator.inner.lock().await;
        assert!(guard.state.is_none());
        drop(guard);

        // The checkpoint itself must still be on file (no implicit purge).
        let latest = coordinator.checkpoints.load_latest("iv-1").await.unwrap();
        assert!(latest.is_some());
    }

    #[tokio::test]
    async fn status_poll_cleans_up_once_terminal() {
        let rows = Arc::new(FakeRows::default());
        rows.insert(empty_row("iv-1"));
        let config = Config {
            status_poll_interval_secs: 1,
            ..Config::default()
        };
        let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
        let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), &config));
        let runtime = GraphRuntime::new(NodeRegistry::new(lm, sandbox, &config));
        let hub = Arc::new(EventHub::new(64));
        let checkpoints: Arc<dyn CheckpointStore> = Arc::new(InMemoryCheckpointStore::new());
        let resumes: Arc<dyn ResumeAccessor> = Arc::new(FakeResumes::default());
        let coordinator = Arc::new(SessionCoordinator::new(
            "iv-1",
            config,
            checkpoints,
            rows.clone(),
            resumes,
            runtime,
            hub,
        ));
        coordinator.execute_step(ExternalInput::Timer).await.unwrap();
        rows.set_status("iv-1", InterviewStatus::Completed);

        let poller = coordinator.clone();
        tokio::time::timeout(std::time::Duration::from_secs(5), poller.run_status_poll())
            .await
            .unwrap();

        assert!(coordinator.inner.lock().await.state.is_none());
    }
}
