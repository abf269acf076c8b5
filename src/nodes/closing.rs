//! `closing` (spec §4.3, action node): a closing message, reached either
//! from an explicit stop intent or after `evaluation` completes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::lm::schema::MessageSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::Phase;
use crate::state::InterviewSnapshot;

pub struct ClosingNode {
    lm: Arc<LmClient>,
}

impl ClosingNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>) -> Self {
        Self { lm }
    }
}

#[async_trait]
impl Node for ClosingNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let request = LmRequest::new(
            "Write a brief, courteous closing message for this interview. Respond \
             with the tagged JSON object the schema expects.",
            format!("topics covered: {:?}", snapshot.control.topics_covered),
            Arc::new(MessageSchema),
            LmMode::Creative,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "closing" },
            _ => NodeError::LmSchemaFailure { node: "closing" },
        })?;

        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Thanks for your time today, we'll be in touch.")
            .to_string();

        let delta = StateDelta::new().with_control(ControlDelta {
            next_message: Some(message),
            phase: Some(Phase::Closing),
            ..ControlDelta::default()
        });

        ctx.emit("closing: interview wrapped up")?;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::event_bus::EventHub;
    use crate::lm::mock::MockLmBackend;
    use crate::state::InterviewState;
    use crate::types::NodeKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn produces_a_closing_message_and_phase() {
        let config = Config::default();
        let node = ClosingNode::new(Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config)));
        let hub = Arc::new(EventHub::new(16));
        let ctx = NodeContext::new(NodeKind::Closing, 0, hub.emitter());
        let state = InterviewState::new("iv-1");
        let snapshot = state.snapshot();

        let delta = node.run(&snapshot, &ctx).await.unwrap();
        assert_eq!(delta.control.phase, Some(Phase::Closing));
        assert!(delta.control.next_message.is_some());
    }
}
