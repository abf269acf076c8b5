//! Identifiers shared between the graph, the channels and the reducers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The twelve named handlers that make up the interview graph, plus the two
/// virtual endpoints every graph declares.
///
/// Unlike a free-form `Custom(String)` wrapper, the node set for this domain
/// is closed (spec §4.3/§4.8), so it is spelled out as an enum: routing
/// functions, the reducer registry and the graph builder can all match
/// exhaustively on it instead of trusting string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Start,
    End,
    Initialize,
    IngestInput,
    DetectIntent,
    DecideNextAction,
    Greeting,
    Question,
    Followup,
    SandboxGuidance,
    CodeReview,
    Evaluation,
    Closing,
    FinalizeTurn,
}

impl NodeKind {
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, NodeKind::Start)
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, NodeKind::End)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "__start__",
            NodeKind::End => "__end__",
            NodeKind::Initialize => "initialize",
            NodeKind::IngestInput => "ingest_input",
            NodeKind::DetectIntent => "detect_intent",
            NodeKind::DecideNextAction => "decide_next_action",
            NodeKind::Greeting => "greeting",
            NodeKind::Question => "question",
            NodeKind::Followup => "followup",
            NodeKind::SandboxGuidance => "sandbox_guidance",
            NodeKind::CodeReview => "code_review",
            NodeKind::Evaluation => "evaluation",
            NodeKind::Closing => "closing",
            NodeKind::FinalizeTurn => "finalize_turn",
        }
    }

    /// Parse the routable subset of action nodes used as `next_node`
    /// values (spec §4.8's closed decision-output set). Returns `None` for
    /// anything else, including control nodes and the virtual endpoints.
    #[must_use]
    pub fn parse_action_node(s: &str) -> Option<Self> {
        match s {
            "greeting" => Some(NodeKind::Greeting),
            "question" => Some(NodeKind::Question),
            "followup" => Some(NodeKind::Followup),
            "sandbox_guidance" => Some(NodeKind::SandboxGuidance),
            "code_review" => Some(NodeKind::CodeReview),
            "evaluation" => Some(NodeKind::Evaluation),
            "closing" => Some(NodeKind::Closing),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The slices of [`crate::state::InterviewState`], one per reducer /
/// [`crate::channels::Channel`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Turns,
    Questions,
    Intents,
    Submissions,
    Control,
    Errors,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelType::Turns => "turns",
            ChannelType::Questions => "questions",
            ChannelType::Intents => "intents",
            ChannelType::Submissions => "submissions",
            ChannelType::Control => "control",
            ChannelType::Errors => "errors",
        };
        write!(f, "{s}")
    }
}
