//! `followup` (spec §4.3, action node): a deeper question tied to the
//! candidate's most recent turn, used when the decision policy judges the
//! prior answer worth probing further rather than moving to a new facet.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::lm::schema::QuestionSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::{QuestionRecord, QuestionSource, TurnRole};
use crate::state::InterviewSnapshot;

pub struct FollowupNode {
    lm: Arc<LmClient>,
}

impl FollowupNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>) -> Self {
        Self { lm }
    }
}

#[async_trait]
impl Node for FollowupNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let last_user_turn = snapshot
            .turns
            .iter()
            .rev()
            .find(|t| matches!(t.role, TurnRole::User))
            .map(|t| t.content.clone())
            .unwrap_or_default();

        let request = LmRequest::new(
            "Ask one deeper followup question that probes the candidate's most \
             recent answer. Respond with the tagged JSON object the schema expects.",
            format!("most recent answer: {last_user_turn}"),
            Arc::new(QuestionSchema),
            LmMode::Creative,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "followup" },
            _ => NodeError::LmSchemaFailure { node: "followup" },
        })?;

        let text = value
            .get("question")
            .and_then(|v| v.as_str())
            .unwrap_or("Can you expand on that?")
            .to_string();

        let record = QuestionRecord {
            question_id: Uuid::new_v4().to_string(),
            text: text.clone(),
            source: QuestionSource::Followup,
            asked_at_turn: snapshot.control.turn_count,
            resume_anchor: None,
        };

        let delta = StateDelta::new().with_question(record).with_control(ControlDelta {
            next_message: Some(text),
            ..ControlDelta::default()
        });

        ctx.emit("followup: deeper question asked")?;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::event_bus::EventHub;
    use crate::lm::mock::MockLmBackend;
    use crate::records::TurnRecord;
    use crate::state::InterviewState;
    use crate::types::NodeKind;
    use std::sync::Arc;

    fn ctx() -> NodeContext {
        let hub = Arc::new(EventHub::new(16));
        NodeContext::new(NodeKind::Followup, 0, hub.emitter())
    }

    fn node() -> FollowupNode {
        let config = Config::default();
        FollowupNode::new(Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config)))
    }

    #[tokio::test]
    async fn produces_a_followup_sourced_question() {
        let mut state = InterviewState::new("iv-1");
        state
            .turns
            .items
            .push(TurnRecord::user("I built a rate limiter in Rust", chrono::Utc::now()));
        let snapshot = state.snapshot();

        let delta = node().run(&snapshot, &ctx()).await.unwrap();
        assert_eq!(delta.questions[0].source, QuestionSource::Followup);
        assert!(delta.control.next_message.is_some());
    }
}
