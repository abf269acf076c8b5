//! The `Node` trait and the state-delta type every node returns (spec §4.3).
//!
//! A node is a pure async function of a snapshot to a delta; it never
//! mutates its input, and it is the runtime's job (see [`crate::graph`])
//! to merge the delta back into the working state via the reducers in
//! [`crate::reducers`].

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_bus::{EmitterError, Event, EventEmitter};
use crate::records::{
    CodeSubmission, EvaluationRecord, IntentRecord, Phase, QuestionRecord, ResumeContext,
    SandboxState, TurnRecord,
};
use crate::state::InterviewSnapshot;
use crate::types::NodeKind;

/// The single-writer / structured-replace half of a node's output. Every
/// field is optional: `Some` means "this node wrote this field this run",
/// `None` means "left untouched" (spec §4.1's single-writer rule: `new =
/// delta if delta is present else base`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlDelta {
    pub next_message: Option<String>,
    pub phase: Option<Phase>,
    pub next_node: Option<String>,
    pub turn_count: Option<u32>,
    pub answer_quality: Option<f32>,
    pub active_user_request: Option<IntentRecord>,
    pub clear_active_user_request: bool,
    pub sandbox: Option<SandboxState>,
    pub resume_context: Option<ResumeContext>,
    pub topics_covered: Option<Vec<String>>,
    pub evaluation: Option<EvaluationRecord>,
    pub last_response: Option<String>,
    pub clear_last_response: bool,
    pub current_code: Option<String>,
    pub clear_current_code: bool,
    pub current_language: Option<String>,
}

/// What a node hands back to the runtime: a set of append-only items for
/// each append channel, plus an optional control delta. `last_node` is set
/// by the runtime itself after a node returns (spec §4.3: "every node sets
/// `last_node` to its own name" — centralized here so nodes cannot forget
/// it or disagree with their own registered [`NodeKind`]).
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub turns: Vec<TurnRecord>,
    pub questions: Vec<QuestionRecord>,
    pub intents: Vec<IntentRecord>,
    pub submissions: Vec<CodeSubmission>,
    pub control: ControlDelta,
}

impl StateDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_turn(mut self, turn: TurnRecord) -> Self {
        self.turns.push(turn);
        self
    }

    #[must_use]
    pub fn with_question(mut self, question: QuestionRecord) -> Self {
        self.questions.push(question);
        self
    }

    #[must_use]
    pub fn with_intent(mut self, intent: IntentRecord) -> Self {
        self.intents.push(intent);
        self
    }

    #[must_use]
    pub fn with_submission(mut self, submission: CodeSubmission) -> Self {
        self.submissions.push(submission);
        self
    }

    #[must_use]
    pub fn with_control(mut self, control: ControlDelta) -> Self {
        self.control = control;
        self
    }

    /// Whether this delta writes any control field at all; used to decide
    /// whether the control channel's version should bump.
    #[must_use]
    pub fn touches_control(&self) -> bool {
        let c = &self.control;
        c.next_message.is_some()
            || c.phase.is_some()
            || c.next_node.is_some()
            || c.turn_count.is_some()
            || c.answer_quality.is_some()
            || c.active_user_request.is_some()
            || c.clear_active_user_request
            || c.sandbox.is_some()
            || c.resume_context.is_some()
            || c.topics_covered.is_some()
            || c.evaluation.is_some()
            || c.last_response.is_some()
            || c.clear_last_response
            || c.current_code.is_some()
            || c.clear_current_code
            || c.current_language.is_some()
    }
}

/// Errors a node can raise during `run`.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("node {node} requires input that was not present: {what}")]
    #[diagnostic(code(interview_engine::node::missing_input))]
    MissingInput { node: &'static str, what: &'static str },

    #[error("language-model call from {node} timed out")]
    #[diagnostic(
        code(interview_engine::node::lm_timeout),
        help("retries are exhausted; the caller should receive an error and no checkpoint")
    )]
    LmTimeout { node: &'static str },

    #[error("language-model call from {node} failed schema validation after retries")]
    #[diagnostic(code(interview_engine::node::lm_schema_failure))]
    LmSchemaFailure { node: &'static str },

    #[error("code submission from {node} failed validation: {reason}")]
    #[diagnostic(code(interview_engine::node::validation_failed))]
    ValidationFailed { node: &'static str, reason: String },

    #[error("event bus unavailable while running {node}")]
    #[diagnostic(code(interview_engine::node::event_bus))]
    EventBus {
        node: &'static str,
        #[source]
        source: EmitterError,
    },

    #[error("underlying provider error in {node}: {message}")]
    #[diagnostic(code(interview_engine::node::provider))]
    Provider { node: &'static str, message: String },
}

/// Per-invocation context handed to a node: its own identity, the graph
/// step counter, and an emitter for the diagnostic event stream.
#[derive(Clone)]
pub struct NodeContext {
    pub node_kind: NodeKind,
    pub step: u64,
    emitter: Arc<dyn EventEmitter>,
}

impl NodeContext {
    #[must_use]
    pub fn new(node_kind: NodeKind, step: u64, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            node_kind,
            step,
            emitter,
        }
    }

    pub fn emit(&self, message: impl Into<String>) -> Result<(), NodeError> {
        self.emitter
            .emit(Event::node_message_with_meta(
                self.node_kind.as_str(),
                self.step,
                "node",
                message,
            ))
            .map_err(|source| NodeError::EventBus {
                node: self.node_kind.as_str(),
                source,
            })
    }

    pub fn emit_diagnostic(&self, scope: impl Into<String>, message: impl Into<String>) -> Result<(), NodeError> {
        self.emitter
            .emit(Event::diagnostic(scope, message))
            .map_err(|source| NodeError::EventBus {
                node: self.node_kind.as_str(),
                source,
            })
    }
}

/// An action or control handler: a pure async function of a state
/// snapshot to a delta (spec §4.3).
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_delta_does_not_touch_control() {
        assert!(!StateDelta::new().touches_control());
    }

    #[test]
    fn delta_with_only_clear_flag_touches_control() {
        let mut delta = StateDelta::new();
        delta.control.clear_current_code = true;
        assert!(delta.touches_control());
    }

    #[test]
    fn delta_clearing_active_user_request_touches_control() {
        let mut delta = StateDelta::new();
        delta.control.clear_active_user_request = true;
        assert!(delta.touches_control());
    }
}
