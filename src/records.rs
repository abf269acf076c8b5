//! The data model of §3: the entities that live inside [`crate::state::InterviewState`].
//!
//! Every type here is a plain, exhaustively-typed record — no open-ended
//! `HashMap<String, Value>` bags. That is a deliberate departure from a
//! looser "dynamic field dictionary" shape; reducers and nodes match on
//! these fields exhaustively instead of probing an untyped map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `role ∈ {user, assistant, system}` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

/// One entry of `conversation_history`. Created by `finalize_turn` (or, for
/// the initial reconstruction, the external interview row); never mutated
/// or deleted afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TurnRecord {
    #[must_use]
    pub fn new(role: TurnRole, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
            metadata: None,
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(TurnRole::User, content, timestamp)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(TurnRole::Assistant, content, timestamp)
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// `source ∈ {greeting, question, followup}` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Greeting,
    Question,
    Followup,
}

/// One entry of `questions_asked`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: String,
    pub text: String,
    pub source: QuestionSource,
    pub asked_at_turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_anchor: Option<String>,
}

/// The closed intent-type set of spec §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    TechnicalAssessment,
    ChangeTopic,
    Clarify,
    Stop,
    Continue,
    WriteCode,
    UseSandbox,
    ReviewCode,
    CodeWalkthrough,
    ShowCode,
    NoIntent,
}

impl IntentType {
    /// Parse the wire representation used by [`crate::lm::schema::IntentSchema`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technical_assessment" => Some(IntentType::TechnicalAssessment),
            "change_topic" => Some(IntentType::ChangeTopic),
            "clarify" => Some(IntentType::Clarify),
            "stop" => Some(IntentType::Stop),
            "continue" => Some(IntentType::Continue),
            "write_code" => Some(IntentType::WriteCode),
            "use_sandbox" => Some(IntentType::UseSandbox),
            "review_code" => Some(IntentType::ReviewCode),
            "code_walkthrough" => Some(IntentType::CodeWalkthrough),
            "show_code" => Some(IntentType::ShowCode),
            "no_intent" => Some(IntentType::NoIntent),
            _ => None,
        }
    }

    /// Tie-break rank used when two intents tie on confidence and
    /// `extracted_from_turn` (spec §4.3 edge cases): higher wins.
    #[must_use]
    pub fn tie_break_rank(&self) -> u8 {
        match self {
            IntentType::Stop => 6,
            IntentType::ChangeTopic => 5,
            IntentType::WriteCode | IntentType::ReviewCode => 4,
            IntentType::Clarify => 3,
            IntentType::TechnicalAssessment => 2,
            IntentType::Continue => 1,
            IntentType::UseSandbox | IntentType::CodeWalkthrough | IntentType::ShowCode => 4,
            IntentType::NoIntent => 0,
        }
    }
}

/// One entry of `detected_intents`. Created by `detect_intent`; always
/// appended regardless of confidence (spec §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    #[serde(rename = "type")]
    pub kind: IntentType,
    pub confidence: f32,
    pub extracted_from_turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl IntentRecord {
    #[must_use]
    pub fn meets_threshold(&self, threshold: f32) -> bool {
        self.confidence >= threshold && !matches!(self.kind, IntentType::NoIntent)
    }
}

/// `language ∈ {python, javascript}` (spec §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Javascript,
}

impl Language {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::Javascript),
            _ => None,
        }
    }
}

/// The sandbox executor's raw response (spec §4.5, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub stdout_truncated: bool,
    #[serde(default)]
    pub stderr_truncated: bool,
    /// Set when the client synthesized this result because the real
    /// executor was unreachable (`SandboxUnavailable`, spec §4.5).
    #[serde(default)]
    pub unavailable: bool,
}

/// The structured sibling of a `code_review` node's quality assessment of
/// one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

/// One entry of `code_submissions`. Created by `code_review` after the
/// sandbox returns; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub source_code: String,
    pub language: Language,
    pub execution: ExecutionResult,
    pub quality: QualityAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// The `sandbox` structured sub-object (spec §3): replaced wholesale, never
/// merged field-by-field, whenever a node writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SandboxState {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_code_snapshot: Option<String>,
    #[serde(default)]
    pub exercise_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub submission_count: u32,
}

/// Structured per-skill evaluation payload (SPEC_FULL.md supplemental §3):
/// a typed sibling of `evaluation`'s spoken `next_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAssessment {
    pub skill: String,
    pub score: f32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationRecord {
    pub assessments: Vec<SkillAssessment>,
    pub overall_summary: String,
}

/// Read-only structured view of a resume (spec §6 "Resume accessor").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResumeContext {
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ResumeContext {
    /// All facets ("anchors", per the glossary) that a question can draw
    /// on, in a stable, deterministic order.
    #[must_use]
    pub fn anchors(&self) -> Vec<String> {
        self.projects
            .iter()
            .chain(self.experience.iter())
            .chain(self.skills.iter())
            .cloned()
            .collect()
    }
}

/// Coarse-grained interview stage (spec §3, glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    Exploration,
    Technical,
    Closing,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Intro
    }
}

/// The closed decision-output set of spec §4.8, a.k.a. `next_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextNode {
    Greeting,
    Question,
    Followup,
    SandboxGuidance,
    CodeReview,
    Evaluation,
    Closing,
}

impl NextNode {
    /// Parse the wire representation used by [`crate::lm::schema::NextNodeSchema`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "greeting" => Some(NextNode::Greeting),
            "question" => Some(NextNode::Question),
            "followup" => Some(NextNode::Followup),
            "sandbox_guidance" => Some(NextNode::SandboxGuidance),
            "code_review" => Some(NextNode::CodeReview),
            "evaluation" => Some(NextNode::Evaluation),
            "closing" => Some(NextNode::Closing),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node_kind(self) -> crate::types::NodeKind {
        use crate::types::NodeKind;
        match self {
            NextNode::Greeting => NodeKind::Greeting,
            NextNode::Question => NodeKind::Question,
            NextNode::Followup => NodeKind::Followup,
            NextNode::SandboxGuidance => NodeKind::SandboxGuidance,
            NextNode::CodeReview => NodeKind::CodeReview,
            NextNode::Evaluation => NodeKind::Evaluation,
            NextNode::Closing => NodeKind::Closing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_meets_threshold_rejects_no_intent_even_at_high_confidence() {
        let rec = IntentRecord {
            kind: IntentType::NoIntent,
            confidence: 0.99,
            extracted_from_turn: 1,
            payload: None,
        };
        assert!(!rec.meets_threshold(0.7));
    }

    #[test]
    fn intent_meets_threshold_accepts_exact_boundary() {
        let rec = IntentRecord {
            kind: IntentType::Continue,
            confidence: 0.7,
            extracted_from_turn: 1,
            payload: None,
        };
        assert!(rec.meets_threshold(0.7));
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!(Language::parse("Python"), Some(Language::Python));
        assert_eq!(Language::parse("JS"), Some(Language::Javascript));
        assert_eq!(Language::parse("ruby"), None);
    }

    #[test]
    fn stop_outranks_everything_in_tie_break() {
        assert!(IntentType::Stop.tie_break_rank() > IntentType::ChangeTopic.tie_break_rank());
        assert!(IntentType::ChangeTopic.tie_break_rank() > IntentType::WriteCode.tie_break_rank());
        assert!(IntentType::WriteCode.tie_break_rank() > IntentType::Clarify.tie_break_rank());
        assert!(
            IntentType::Clarify.tie_break_rank() > IntentType::TechnicalAssessment.tie_break_rank()
        );
        assert!(
            IntentType::TechnicalAssessment.tie_break_rank() > IntentType::Continue.tie_break_rank()
        );
    }

    #[test]
    fn intent_type_parse_round_trips_with_tie_break_rank() {
        assert_eq!(IntentType::parse("stop"), Some(IntentType::Stop));
        assert_eq!(IntentType::parse("teleport"), None);
    }

    #[test]
    fn next_node_parse_rejects_unknown_value() {
        assert_eq!(NextNode::parse("teleport"), None);
        assert_eq!(NextNode::parse("closing"), Some(NextNode::Closing));
    }

    #[test]
    fn turn_record_serializes_role_snake_case() {
        let t = TurnRecord::user("hi", Utc::now());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["role"], "user");
    }
}
