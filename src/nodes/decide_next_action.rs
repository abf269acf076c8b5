//! `decide_next_action` (spec §4.3/§4.8, control node): asks the language
//! model for a routing suggestion, then layers the ordered policy rules in
//! [`crate::policy`] on top of it before writing `next_node`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::lm::schema::NextNodeSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::policy::decide_next_node;
use crate::records::NextNode;
use crate::state::InterviewSnapshot;

pub struct DecideNextActionNode {
    lm: Arc<LmClient>,
    evaluation_turn_threshold: u32,
}

impl DecideNextActionNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>, evaluation_turn_threshold: u32) -> Self {
        Self {
            lm,
            evaluation_turn_threshold,
        }
    }
}

fn decision_context(snapshot: &InterviewSnapshot) -> String {
    format!(
        "phase: {:?}\nturn_count: {}\nanswer_quality: {:?}\ntopics_covered: {:?}\nquestions_asked: {}",
        snapshot.control.phase,
        snapshot.control.turn_count,
        snapshot.control.answer_quality,
        snapshot.control.topics_covered,
        snapshot.questions.len(),
    )
}

#[async_trait]
impl Node for DecideNextActionNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let request = LmRequest::new(
            "Suggest the next interviewer action node for this interview, given its \
             current state. Respond with the tagged JSON object the schema expects.",
            decision_context(snapshot),
            Arc::new(NextNodeSchema),
            LmMode::Deterministic,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout {
                node: "decide_next_action",
            },
            _ => NodeError::LmSchemaFailure {
                node: "decide_next_action",
            },
        })?;

        let lm_suggestion = value
            .get("next_node")
            .and_then(|v| v.as_str())
            .and_then(NextNode::parse)
            .unwrap_or_else(|| {
                NextNode::Question
            });

        let decided = decide_next_node(&snapshot.control, lm_suggestion, self.evaluation_turn_threshold);

        let delta = StateDelta::new().with_control(ControlDelta {
            next_node: Some(decided.as_node_kind().as_str().to_string()),
            ..ControlDelta::default()
        });

        ctx.emit(format!("decide_next_action: routing to {}", decided.as_node_kind()))?;
        Ok(delta)
    }
}
