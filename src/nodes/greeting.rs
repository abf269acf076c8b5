//! `greeting` (spec §4.3, action node): a personalized opener drawn from
//! the candidate's [`ResumeContext`]. A no-op once any user turn already
//! exists, guarding against a reconnect replaying the opener.

use std::sync::Arc;

use async_trait::async_trait;

use crate::lm::schema::MessageSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::{Phase, TurnRole};
use crate::state::InterviewSnapshot;

pub struct GreetingNode {
    lm: Arc<LmClient>,
}

impl GreetingNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>) -> Self {
        Self { lm }
    }
}

#[async_trait]
impl Node for GreetingNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let already_greeted = snapshot
            .turns
            .iter()
            .any(|t| matches!(t.role, TurnRole::User));
        if already_greeted {
            ctx.emit("greeting: skipped, interview already underway")?;
            return Ok(StateDelta::new());
        }

        let resume = &snapshot.control.resume_context;
        let request = LmRequest::new(
            "Write a warm, brief interviewer greeting that references the candidate's \
             background. Respond with the tagged JSON object the schema expects.",
            format!(
                "profile: {}\nexperience: {:?}\nprojects: {:?}",
                resume.profile, resume.experience, resume.projects
            ),
            Arc::new(MessageSchema),
            LmMode::Creative,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "greeting" },
            _ => NodeError::LmSchemaFailure { node: "greeting" },
        })?;

        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Welcome, let's get started.")
            .to_string();

        let delta = StateDelta::new().with_control(ControlDelta {
            next_message: Some(message),
            phase: Some(Phase::Intro),
            ..ControlDelta::default()
        });

        ctx.emit("greeting: opener generated")?;
        Ok(delta)
    }
}
