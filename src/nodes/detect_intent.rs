//! `detect_intent` (spec §4.3, control node): classifies the interviewee's
//! last utterance against the closed [`IntentType`] set via the language
//! model, always appending to `detected_intents` and promoting the result
//! to `active_user_request` only when it clears the confidence threshold.

use std::sync::Arc;

use async_trait::async_trait;

use crate::lm::schema::IntentSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::{IntentRecord, IntentType, TurnRole};
use crate::state::InterviewSnapshot;

const CONVERSATION_TAIL: usize = 6;

pub struct DetectIntentNode {
    lm: Arc<LmClient>,
    confidence_threshold: f32,
}

impl DetectIntentNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>, confidence_threshold: f32) -> Self {
        Self {
            lm,
            confidence_threshold,
        }
    }
}

fn render_tail(snapshot: &InterviewSnapshot) -> String {
    snapshot
        .turns
        .iter()
        .rev()
        .take(CONVERSATION_TAIL)
        .rev()
        .map(|t| {
            let role = match t.role {
                TurnRole::User => "candidate",
                TurnRole::Assistant => "interviewer",
                TurnRole::System => "system",
            };
            format!("{role}: {}", t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Node for DetectIntentNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let last_utterance = snapshot.control.last_response.clone().unwrap_or_default();
        let request = LmRequest::new(
            "Classify the candidate's most recent utterance into exactly one of the \
             closed intent types. Respond with the tagged JSON object the schema expects.",
            format!(
                "conversation so far:\n{}\n\nmost recent utterance: {}",
                render_tail(snapshot),
                last_utterance
            ),
            Arc::new(IntentSchema),
            LmMode::Deterministic,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "detect_intent" },
            _ => NodeError::LmSchemaFailure { node: "detect_intent" },
        })?;

        let kind = value
            .get("type")
            .and_then(|v| v.as_str())
            .and_then(IntentType::parse)
            .unwrap_or(IntentType::NoIntent);
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32;
        let payload = value.get("payload").cloned();

        let record = IntentRecord {
            kind,
            confidence,
            extracted_from_turn: snapshot.control.turn_count,
            payload,
        };

        let mut delta = StateDelta::new().with_intent(record.clone());

        if record.meets_threshold(self.confidence_threshold) {
            let promote = match &snapshot.control.active_user_request {
                Some(existing)
                    if (existing.confidence - record.confidence).abs() < f32::EPSILON
                        && existing.kind.tie_break_rank() > record.kind.tie_break_rank() =>
                {
                    false
                }
                _ => true,
            };
            if promote {
                delta.control = ControlDelta {
                    active_user_request: Some(record),
                    ..ControlDelta::default()
                };
            }
        } else {
            delta.control = ControlDelta {
                clear_active_user_request: true,
                ..ControlDelta::default()
            };
        }

        ctx.emit(format!("detect_intent: classified as {:?}", kind))?;
        Ok(delta)
    }
}
