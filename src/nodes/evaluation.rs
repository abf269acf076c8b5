//! `evaluation` (spec §4.3, action node): a comprehensive per-skill
//! assessment once coverage and turn-count thresholds are met. Writes both
//! the spoken summary and the supplemental structured [`EvaluationRecord`]
//! (SPEC_FULL.md supplemental #3), and moves the interview to `Closing`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::lm::schema::EvaluationSchema;
use crate::lm::{LmClient, LmError, LmMode, LmRequest};
use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::{EvaluationRecord, Phase, SkillAssessment};
use crate::state::InterviewSnapshot;

pub struct EvaluationNode {
    lm: Arc<LmClient>,
}

impl EvaluationNode {
    #[must_use]
    pub fn new(lm: Arc<LmClient>) -> Self {
        Self { lm }
    }
}

#[async_trait]
impl Node for EvaluationNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let transcript: Vec<String> = snapshot
            .turns
            .iter()
            .map(|t| format!("{:?}: {}", t.role, t.content))
            .collect();

        let request = LmRequest::new(
            "Produce a comprehensive per-skill assessment of this candidate based on \
             the full transcript. Respond with the tagged JSON object the schema expects.",
            format!(
                "topics covered: {:?}\ntranscript:\n{}",
                snapshot.control.topics_covered,
                transcript.join("\n")
            ),
            Arc::new(EvaluationSchema),
            LmMode::Deterministic,
        );

        let value = self.lm.call(request).await.map_err(|e| match e {
            LmError::Timeout => NodeError::LmTimeout { node: "evaluation" },
            _ => NodeError::LmSchemaFailure { node: "evaluation" },
        })?;

        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Here's a summary of how the interview went.")
            .to_string();

        let assessments = value
            .get("assessments")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| {
                        let obj = a.as_object()?;
                        Some(SkillAssessment {
                            skill: obj.get("skill")?.as_str()?.to_string(),
                            score: obj.get("score")?.as_f64()? as f32,
                            notes: obj
                                .get("notes")
                                .and_then(|n| n.as_str())
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let overall_summary = value
            .get("overall_summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let delta = StateDelta::new().with_control(ControlDelta {
            next_message: Some(message),
            phase: Some(Phase::Closing),
            evaluation: Some(EvaluationRecord {
                assessments,
                overall_summary,
            }),
            ..ControlDelta::default()
        });

        ctx.emit("evaluation: assessment produced")?;
        Ok(delta)
    }
}
