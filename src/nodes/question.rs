//! `question` (spec §4.3, action node): picks an unexplored resume facet
//! and asks about it. Retries against a fresh anchor up to three times
//! when a candidate collides with an already-asked question (spec §4.3
//! edge cases), then falls through to a followup-style question tied to
//! the most recent user turn if every anchor is exhausted.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::lm::schema::QuestionSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::nodes::dedup::is_duplicate;
use crate::records::{QuestionRecord, QuestionSource, TurnRole};
use crate::state::InterviewSnapshot;

const MAX_ANCHOR_RETRIES: usize = 3;

pub struct QuestionNode {
    lm: Arc<LmClient>,
    dup_overlap_threshold: f32,
}

impl QuestionNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>, dup_overlap_threshold: f32) -> Self {
        Self {
            lm,
            dup_overlap_threshold,
        }
    }

    async fn ask_about(&self, anchor: &str) -> Result<String, LmError> {
        let request = LmRequest::new(
            "Ask one focused interview question about the given resume facet. \
             Respond with the tagged JSON object the schema expects.",
            format!("resume facet: {anchor}"),
            Arc::new(QuestionSchema),
            LmMode::Creative,
        );
        let value = self.lm.call(request).await?;
        Ok(value
            .get("question")
            .and_then(|v| v.as_str())
            .unwrap_or("Tell me more about that.")
            .to_string())
    }

    async fn ask_followup(&self, last_user_turn: &str) -> Result<String, LmError> {
        let request = LmRequest::new(
            "Every prepared resume facet collided with an already-asked question. \
             Ask a deeper followup tied to the candidate's most recent answer instead. \
             Respond with the tagged JSON object the schema expects.",
            format!("most recent answer: {last_user_turn}"),
            Arc::new(QuestionSchema),
            LmMode::Creative,
        );
        let value = self.lm.call(request).await?;
        Ok(value
            .get("question")
            .and_then(|v| v.as_str())
            .unwrap_or("Can you go deeper on that last point?")
            .to_string())
    }
}

#[async_trait]
impl Node for QuestionNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let anchors = snapshot.control.resume_context.anchors();
        let untried: Vec<&String> = anchors
            .iter()
            .filter(|a| !snapshot.control.topics_covered.contains(a))
            .collect();

        let mut attempt_text: Option<String> = None;
        let mut attempt_anchor: Option<String> = None;
        let mut source = QuestionSource::Question;

        for anchor in untried.into_iter().take(MAX_ANCHOR_RETRIES) {
            let candidate = self.ask_about(anchor).await.map_err(|e| match e {
                LmError::Timeout => NodeError::LmTimeout { node: "question" },
                _ => NodeError::LmSchemaFailure { node: "question" },
            })?;
            if !is_duplicate(&candidate, &snapshot.questions, self.dup_overlap_threshold) {
                attempt_text = Some(candidate);
                attempt_anchor = Some(anchor.clone());
                break;
            }
        }

        if attempt_text.is_none() {
            let last_user_turn = snapshot
                .turns
                .iter()
                .rev()
                .find(|t| matches!(t.role, TurnRole::User))
                .map(|t| t.content.clone())
                .unwrap_or_default();
            let candidate = self.ask_followup(&last_user_turn).await.map_err(|e| match e {
                LmError::Timeout => NodeError::LmTimeout { node: "question" },
                _ => NodeError::LmSchemaFailure { node: "question" },
            })?;
            attempt_text = Some(candidate);
            source = QuestionSource::Followup;
        }

        let text = attempt_text.expect("always populated above");
        let record = QuestionRecord {
            question_id: Uuid::new_v4().to_string(),
            text: text.clone(),
            source,
            asked_at_turn: snapshot.control.turn_count,
            resume_anchor: attempt_anchor.clone(),
        };

        let mut delta = StateDelta::new().with_question(record);
        delta.control = ControlDelta {
            next_message: Some(text),
            topics_covered: attempt_anchor.map(|a| vec![a]),
            ..ControlDelta::default()
        };

        ctx.emit("question: new question asked")?;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::event_bus::EventHub;
    use crate::lm::mock::MockLmBackend;
    use crate::records::ResumeContext;
    use crate::state::InterviewState;
    use crate::types::NodeKind;
    use std::sync::Arc;

    fn ctx() -> NodeContext {
        let hub = Arc::new(EventHub::new(16));
        NodeContext::new(NodeKind::Question, 0, hub.emitter())
    }

    fn node() -> QuestionNode {
        let config = Config::default();
        let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
        QuestionNode::new(lm, config.dup_question_overlap_threshold)
    }

    #[tokio::test]
    async fn asks_about_an_untried_anchor() {
        let mut state = InterviewState::new("iv-1");
        state.control.fields.resume_context = ResumeContext {
            profile: "backend engineer".to_string(),
            experience: vec!["Acme Corp".to_string()],
            education: vec![],
            projects: vec!["rate limiter".to_string()],
            skills: vec!["rust".to_string()],
        };
        let snapshot = state.snapshot();

        let delta = node().run(&snapshot, &ctx()).await.unwrap();
        assert_eq!(delta.questions.len(), 1);
        assert_eq!(delta.questions[0].source, QuestionSource::Question);
        assert_eq!(delta.control.topics_covered, Some(vec!["rate limiter".to_string()]));
    }
}
