//! `code_review` (spec §4.3, action node): runs the candidate's submitted
//! code through the sandbox, asks the language model to assess quality,
//! and composes feedback plus an adaptive followup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::Config;
use crate::lm::schema::CodeReviewSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::{CodeSubmission, QualityAnalysis};
use crate::sandbox::{validate_submission, SandboxClient};
use crate::state::InterviewSnapshot;

pub struct CodeReviewNode {
    lm: Arc<LmClient>,
    sandbox: Arc<SandboxClient>,
    code_max_bytes: usize,
}

impl CodeReviewNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>, sandbox: Arc<SandboxClient>, config: &Config) -> Self {
        Self {
            lm,
            sandbox,
            code_max_bytes: config.code_max_bytes,
        }
    }
}

#[async_trait]
impl Node for CodeReviewNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let code = snapshot
            .control
            .current_code
            .as_ref()
            .ok_or(NodeError::MissingInput {
                node: "code_review",
                what: "current_code",
            })?;
        let language_str = snapshot.control.current_language.as_deref().unwrap_or("python");

        let config = Config {
            code_max_bytes: self.code_max_bytes,
            ..Config::default()
        };
        let language = validate_submission(code, language_str, &config).map_err(|e| NodeError::ValidationFailed {
            node: "code_review",
            reason: e.to_string(),
        })?;

        let execution = self.sandbox.submit(code, language).await;

        let request = LmRequest::new(
            "Assess the quality of this code submission given its execution result. \
             Respond with the tagged JSON object the schema expects.",
            format!(
                "code:\n{code}\n\nstdout: {}\nstderr: {}\nexit_code: {}",
                execution.stdout, execution.stderr, execution.exit_code
            ),
            Arc::new(CodeReviewSchema),
            LmMode::Deterministic,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "code_review" },
            _ => NodeError::LmSchemaFailure { node: "code_review" },
        })?;

        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Thanks for the submission, let's discuss it.")
            .to_string();

        let quality_value = value.get("quality").cloned().unwrap_or_default();
        let quality = QualityAnalysis {
            summary: quality_value
                .get("summary")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            strengths: quality_value
                .get("strengths")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            concerns: quality_value
                .get("concerns")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            score: quality_value.get("score").and_then(|v| v.as_f64()).map(|n| n as f32),
        };

        let submission = CodeSubmission {
            source_code: code.clone(),
            language,
            execution,
            quality: quality.clone(),
            timestamp: Utc::now(),
        };

        let mut sandbox_state = snapshot.control.sandbox.clone();
        sandbox_state.last_code_snapshot = Some(code.clone());
        sandbox_state.submission_count = sandbox_state.submission_count.saturating_add(1);

        let delta = StateDelta::new()
            .with_submission(submission)
            .with_control(ControlDelta {
                next_message: Some(message),
                sandbox: Some(sandbox_state),
                answer_quality: quality.score,
                ..ControlDelta::default()
            });

        ctx.emit("code_review: submission reviewed")?;
        Ok(delta)
    }
}
