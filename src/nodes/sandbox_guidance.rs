//! `sandbox_guidance` (spec §4.3, action node): activates the sandbox and,
//! on first entry, generates a starter coding exercise from the language
//! model. The `sandbox` sub-object is replaced wholesale per turn (spec
//! §3), so this node always starts from the current snapshot's value and
//! writes a full new copy back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::lm::schema::SandboxGuidanceSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::state::InterviewSnapshot;

pub struct SandboxGuidanceNode {
    lm: Arc<LmClient>,
}

impl SandboxGuidanceNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>) -> Self {
        Self { lm }
    }
}

#[async_trait]
impl Node for SandboxGuidanceNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let mut sandbox = snapshot.control.sandbox.clone();
        let first_entry = !sandbox.active || sandbox.exercise_description.is_empty();
        sandbox.active = true;
        sandbox.last_activity = Some(Utc::now());

        let message = if first_entry {
            let request = LmRequest::new(
                "Propose a short coding exercise appropriate for this interview's \
                 phase. Respond with the tagged JSON object the schema expects.",
                format!("phase: {:?}, topics covered: {:?}", snapshot.control.phase, snapshot.control.topics_covered),
                Arc::new(SandboxGuidanceSchema),
                LmMode::Creative,
            );
            let value = self.lm.call(request).await.map_err(|e| match e {
                LmError::Timeout => NodeError::LmTimeout {
                    node: "sandbox_guidance",
                },
                _ => NodeError::LmSchemaFailure {
                    node: "sandbox_guidance",
                },
            })?;

            sandbox.exercise_description = value
                .get("exercise_description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            sandbox.starter_code = value
                .get("starter_code")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            sandbox.hints = value
                .get("hints")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|h| h.as_str().map(str::to_string)).collect())
                .unwrap_or_default();

            value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Here's a short exercise to work through in the sandbox.")
                .to_string()
        } else {
            "Go ahead, the sandbox is ready whenever you'd like to submit code.".to_string()
        };

        let delta = StateDelta::new().with_control(ControlDelta {
            next_message: Some(message),
            sandbox: Some(sandbox),
            ..ControlDelta::default()
        });

        ctx.emit("sandbox_guidance: sandbox activated")?;
        Ok(delta)
    }
}
