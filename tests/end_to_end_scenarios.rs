//! End-to-end scenarios (spec §8): literal inputs, expected routing and
//! key state transitions. Exact generated text is LM-dependent and not
//! asserted; the enumerated invariants are.

mod common;

use interview_engine::checkpoint::CheckpointStore;
use interview_engine::coordinator::{
    ExternalInput, InterviewRow, InterviewRowAccessor, InterviewStatus, ResumeAccessor, SessionCoordinator,
};
use interview_engine::records::{IntentType, ResumeContext, TurnRole};
use interview_engine::state::InterviewState;
use interview_engine::types::NodeKind;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::Mutex as StdMutex;

/// A fixed interview row plus a resume, enough to exercise reconnection.
#[derive(Default)]
struct FixtureRows {
    rows: StdMutex<FxHashMap<String, InterviewRow>>,
}

impl FixtureRows {
    fn insert(&self, row: InterviewRow) {
        self.rows.lock().unwrap().insert(row.id.clone(), row);
    }
}

#[async_trait]
impl InterviewRowAccessor for FixtureRows {
    async fn load(
        &self,
        interview_id: &str,
    ) -> Result<Option<InterviewRow>, interview_engine::coordinator::CoordinatorError> {
        Ok(self.rows.lock().unwrap().get(interview_id).cloned())
    }

    async fn status(
        &self,
        interview_id: &str,
    ) -> Result<Option<InterviewStatus>, interview_engine::coordinator::CoordinatorError> {
        Ok(self.rows.lock().unwrap().get(interview_id).map(|r| r.status))
    }
}

#[derive(Default)]
struct FixtureResumes;

#[async_trait]
impl ResumeAccessor for FixtureResumes {
    async fn load(
        &self,
        _resume_id: &str,
    ) -> Result<Option<ResumeContext>, interview_engine::coordinator::CoordinatorError> {
        Ok(Some(ResumeContext {
            profile: "Senior backend engineer".to_string(),
            experience: vec!["5 years at a payments startup".to_string()],
            education: vec!["BS Computer Science".to_string()],
            projects: vec!["Built a recommendation engine at Acme".to_string()],
            skills: vec!["Rust".to_string(), "distributed systems".to_string()],
        }))
    }
}

fn empty_row(id: &str) -> InterviewRow {
    InterviewRow {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        resume_id: Some("resume-1".to_string()),
        job_description: Some("Backend engineer".to_string()),
        status: InterviewStatus::InProgress,
        conversation_history: Vec::new(),
        turn_count: 0,
    }
}

/// Scenario 1: first contact. State absent, empty-utterance connection
/// event. One assistant turn, turn_count stays 0, checkpoint version 1.
#[tokio::test]
async fn scenario_1_first_contact() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let store = common::checkpoint_store();
    let mut state = InterviewState::new("iv-1");

    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();

    assert_eq!(outcome.nodes_executed.first(), Some(&NodeKind::Initialize));
    assert!(outcome.nodes_executed.contains(&NodeKind::Greeting));
    assert_eq!(
        state.turns.items.iter().filter(|t| t.role == TurnRole::Assistant).count(),
        1
    );
    assert_eq!(state.user_turn_count(), 0);

    let checkpoint = store.save("iv-1", &state).await.unwrap();
    assert_eq!(checkpoint.version, 1);
}

/// Scenario 2: a normal question turn after the greeting. Routes through
/// detect_intent/decide_next_action to question; exactly one new question;
/// turn_count becomes 1.
#[tokio::test]
async fn scenario_2_normal_question_turn() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    runtime.run(&mut state, hub.emitter()).await.unwrap();

    state.control.fields.last_response =
        Some("I built a recommendation engine at Acme.".to_string());
    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();

    assert!(outcome.nodes_executed.contains(&NodeKind::DetectIntent));
    assert!(outcome.nodes_executed.contains(&NodeKind::DecideNextAction));
    assert_eq!(state.questions.items.len(), 1);
    assert_eq!(state.control.fields.turn_count, 1);
    assert_eq!(state.user_turn_count(), 1);

    let last_intent = state.intents.items.last().unwrap();
    assert!(matches!(last_intent.kind, IntentType::NoIntent | IntentType::Continue));
}

/// Scenario 3: explicit code request routes to sandbox_guidance and
/// activates the sandbox with a non-empty exercise description.
#[tokio::test]
async fn scenario_3_explicit_code_request() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    runtime.run(&mut state, hub.emitter()).await.unwrap();
    state.control.fields.last_response = Some("I built a recommendation engine at Acme.".to_string());
    runtime.run(&mut state, hub.emitter()).await.unwrap();

    state.control.fields.last_response = Some("Let me write some code to demonstrate.".to_string());
    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();

    let last_intent = state.intents.items.last().unwrap();
    assert!(matches!(last_intent.kind, IntentType::WriteCode | IntentType::UseSandbox));
    assert!(last_intent.confidence >= 0.7);
    assert!(outcome.nodes_executed.contains(&NodeKind::SandboxGuidance));
    assert!(state.control.fields.sandbox.active);
    assert!(!state.control.fields.sandbox.exercise_description.is_empty());
}

/// Scenario 4: a code submission with no utterance bypasses intent
/// detection entirely and lands straight on code_review.
#[tokio::test]
async fn scenario_4_code_review_after_submission() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    runtime.run(&mut state, hub.emitter()).await.unwrap();

    state.control.fields.current_code =
        Some("def fib(n):\n    return n if n<2 else fib(n-1)+fib(n-2)".to_string());
    state.control.fields.current_language = Some("python".to_string());
    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();

    assert!(outcome.nodes_executed.contains(&NodeKind::CodeReview));
    assert!(!outcome.nodes_executed.contains(&NodeKind::DetectIntent));
    assert_eq!(state.submissions.items.len(), 1);
    assert!(state.control.fields.next_message.as_ref().unwrap().len() > 0);
    assert!(state.control.fields.current_code.is_none(), "finalize_turn clears transient input");
}

/// Scenario 5: reconnect mid-interview. A fresh coordinator (simulating a
/// process restart) must load the version-2 checkpoint and continue
/// exactly as an uninterrupted session would.
#[tokio::test]
async fn scenario_5_reconnect_mid_interview() {
    let rows = Arc::new(FixtureRows::default());
    rows.insert(empty_row("iv-5"));
    let resumes: Arc<dyn ResumeAccessor> = Arc::new(FixtureResumes::default());
    let checkpoints = common::checkpoint_store();
    let config = interview_engine::config::Config::default();

    let coordinator_a = SessionCoordinator::new(
        "iv-5",
        config.clone(),
        checkpoints.clone(),
        rows.clone() as Arc<dyn InterviewRowAccessor>,
        resumes.clone(),
        common::mock_runtime(),
        common::hub(),
    );
    coordinator_a.execute_step(ExternalInput::Timer).await.unwrap(); // greeting, v1
    coordinator_a
        .execute_step(ExternalInput::Utterance(
            "I built a recommendation engine at Acme.".to_string(),
        ))
        .await
        .unwrap(); // v2
    drop(coordinator_a);

    // Simulate a process restart: brand-new coordinator, no in-memory state.
    let coordinator_b = SessionCoordinator::new(
        "iv-5",
        config,
        checkpoints.clone(),
        rows as Arc<dyn InterviewRowAccessor>,
        resumes,
        common::mock_runtime(),
        common::hub(),
    );
    let reply = coordinator_b
        .execute_step(ExternalInput::Utterance("Let me write some code to demonstrate.".to_string()))
        .await
        .unwrap();
    assert!(!reply.is_empty());

    let latest = checkpoints.load_latest("iv-5").await.unwrap().unwrap();
    assert_eq!(latest.version, 3);
    let restored = latest.into_state().unwrap();
    assert!(restored.control.fields.sandbox.active);
}

/// Scenario 6: a stop intent forces routing to closing regardless of turn
/// count, and `phase` becomes closing.
#[tokio::test]
async fn scenario_6_stop_intent_forces_closing() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    runtime.run(&mut state, hub.emitter()).await.unwrap();

    state.control.fields.last_response = Some("Let's end the interview here.".to_string());
    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();

    let last_intent = state.intents.items.last().unwrap();
    assert_eq!(last_intent.kind, IntentType::Stop);
    assert!(last_intent.confidence >= 0.7);
    assert!(outcome.nodes_executed.contains(&NodeKind::Closing));
    assert_eq!(state.control.fields.phase, interview_engine::records::Phase::Closing);
}

/// Boundary: empty conversation always greets first, even with code
/// present (spec §8 "Boundary behaviors").
#[tokio::test]
async fn boundary_empty_history_greets_before_code_review() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    state.control.fields.current_code = Some("print(1)".to_string());
    state.control.fields.current_language = Some("python".to_string());

    let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();
    assert!(outcome.nodes_executed.contains(&NodeKind::Greeting));
    assert!(!outcome.nodes_executed.contains(&NodeKind::CodeReview));
}

/// Boundary: re-running with zero-byte input after a successful step adds
/// no new *user* TurnRecord and leaves `turn_count` unchanged — transient
/// inputs were cleared by the prior run's `finalize_turn`, so a timer tick
/// cannot be mistaken for a fresh utterance (spec §8 idempotence law).
#[tokio::test]
async fn boundary_zero_byte_rerun_adds_no_user_turn() {
    let runtime = common::mock_runtime();
    let hub = common::hub();
    let mut state = InterviewState::new("iv-1");
    runtime.run(&mut state, hub.emitter()).await.unwrap();
    state.control.fields.last_response = Some("I built a recommendation engine at Acme.".to_string());
    runtime.run(&mut state, hub.emitter()).await.unwrap();
    let user_turns_before = state.user_turn_count();
    let turn_count_before = state.control.fields.turn_count;

    assert!(state.control.fields.last_response.is_none());
    assert!(state.control.fields.current_code.is_none());

    runtime.run(&mut state, hub.emitter()).await.unwrap();

    assert_eq!(state.user_turn_count(), user_turns_before);
    assert_eq!(state.control.fields.turn_count, turn_count_before);
}
