//! [`InterviewState`]: the sole mutable object threaded through the graph
//! (spec §3), and its self-describing textual encoding (spec §4.1).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channels::{
    Channel, ControlChannel, ErrorsChannel, IntentsChannel, QuestionsChannel, SubmissionsChannel,
    TurnsChannel,
};
use crate::records::{CodeSubmission, IntentRecord, Phase, QuestionRecord, ResumeContext,
    SandboxState, TurnRecord};

/// The single-writer and structured-replace fields (spec §3), serialized
/// as one unit inside [`crate::channels::ControlChannel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ControlFields {
    pub next_message: Option<String>,
    pub phase: Phase,
    pub last_node: Option<String>,
    pub next_node: Option<String>,
    pub turn_count: u32,
    pub answer_quality: Option<f32>,
    pub active_user_request: Option<IntentRecord>,
    pub sandbox: SandboxState,
    pub resume_context: ResumeContext,
    /// SPEC_FULL.md supplemental #1: flat coverage list, not the "legacy"
    /// `resume_exploration` structure the spec excludes.
    pub topics_covered: Vec<String>,
    /// SPEC_FULL.md supplemental #3: structured sibling of the spoken
    /// `evaluation` message.
    pub evaluation: Option<crate::records::EvaluationRecord>,

    // Transient, per-input fields (spec §4.3 `ingest_input`, §4.7 step 3).
    // Cleared by `finalize_turn`; never persisted across a completed turn.
    pub last_response: Option<String>,
    pub current_code: Option<String>,
    pub current_language: Option<String>,
}

/// The canonical mutable state object for one interview.
#[derive(Debug, Clone, Default)]
pub struct InterviewState {
    pub interview_id: String,
    pub turns: TurnsChannel,
    pub questions: QuestionsChannel,
    pub intents: IntentsChannel,
    pub submissions: SubmissionsChannel,
    pub control: ControlChannel,
    pub errors: ErrorsChannel,
}

impl InterviewState {
    #[must_use]
    pub fn new(interview_id: impl Into<String>) -> Self {
        Self {
            interview_id: interview_id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_resume_context(mut self, resume: ResumeContext) -> Self {
        self.control.fields.resume_context = resume;
        self
    }

    /// Invariant 1 (spec §3): `turn_count == count(user turns)`.
    #[must_use]
    pub fn user_turn_count(&self) -> usize {
        self.turns
            .items
            .iter()
            .filter(|t| matches!(t.role, crate::records::TurnRole::User))
            .count()
    }

    #[must_use]
    pub fn snapshot(&self) -> InterviewSnapshot {
        InterviewSnapshot {
            interview_id: self.interview_id.clone(),
            turns: self.turns.snapshot(),
            turns_version: self.turns.version(),
            questions: self.questions.snapshot(),
            questions_version: self.questions.version(),
            intents: self.intents.snapshot(),
            intents_version: self.intents.version(),
            submissions: self.submissions.snapshot(),
            submissions_version: self.submissions.version(),
            control: self.control.fields.clone(),
            control_version: self.control.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }

    /// The self-describing textual encoding of spec §4.1. Backed by
    /// `serde_json` with sorted map keys, which already gives stable key
    /// order and ISO-8601 timestamps via `chrono`'s serde integration.
    pub fn encode(&self) -> Result<String, CorruptStateError> {
        let snapshot = self.snapshot();
        serde_json::to_string(&snapshot).map_err(|e| CorruptStateError {
            reason: e.to_string(),
        })
    }

    pub fn decode(blob: &str) -> Result<Self, CorruptStateError> {
        let snapshot: InterviewSnapshot =
            serde_json::from_str(blob).map_err(|e| CorruptStateError {
                reason: e.to_string(),
            })?;
        Ok(snapshot.into_state())
    }
}

/// A read-only, cloneable view of [`InterviewState`] handed to nodes; the
/// version fields let the barrier step detect which channels actually
/// changed after a node's delta is merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewSnapshot {
    pub interview_id: String,
    pub turns: Vec<TurnRecord>,
    pub turns_version: u32,
    pub questions: Vec<QuestionRecord>,
    pub questions_version: u32,
    pub intents: Vec<IntentRecord>,
    pub intents_version: u32,
    pub submissions: Vec<CodeSubmission>,
    pub submissions_version: u32,
    pub control: ControlFields,
    pub control_version: u32,
    pub errors: Vec<crate::errors::ErrorEvent>,
    pub errors_version: u32,
}

impl InterviewSnapshot {
    #[must_use]
    pub fn into_state(self) -> InterviewState {
        InterviewState {
            interview_id: self.interview_id,
            turns: TurnsChannel {
                items: self.turns,
                version: self.turns_version,
            },
            questions: QuestionsChannel {
                items: self.questions,
                version: self.questions_version,
            },
            intents: IntentsChannel {
                items: self.intents,
                version: self.intents_version,
            },
            submissions: SubmissionsChannel {
                items: self.submissions,
                version: self.submissions_version,
            },
            control: ControlChannel {
                fields: self.control,
                version: self.control_version,
            },
            errors: ErrorsChannel {
                items: self.errors,
                version: self.errors_version,
            },
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("state blob violates schema: {reason}")]
pub struct CorruptStateError {
    pub reason: String,
}
