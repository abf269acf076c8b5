//! Per-call-site output schemas validated by [`super::LmClient`].

use serde_json::Value;

use super::OutputSchema;

fn is_number_in_unit_range(v: &Value) -> bool {
    v.as_f64().is_some_and(|n| (0.0..=1.0).contains(&n))
}

/// `{type, confidence, payload?}` expected from `detect_intent` (spec §4.3).
pub struct IntentSchema;

const INTENT_TYPES: &[&str] = &[
    "technical_assessment",
    "change_topic",
    "clarify",
    "stop",
    "continue",
    "write_code",
    "use_sandbox",
    "review_code",
    "code_walkthrough",
    "show_code",
    "no_intent",
];

impl OutputSchema for IntentSchema {
    fn name(&self) -> &'static str {
        "intent"
    }

    fn validate(&self, value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return false;
        };
        let kind_ok = obj
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|s| INTENT_TYPES.contains(&s));
        let confidence_ok = obj
            .get("confidence")
            .is_some_and(is_number_in_unit_range);
        kind_ok && confidence_ok
    }
}

/// `{next_node}` expected from `decide_next_action` (spec §4.8).
pub struct NextNodeSchema;

const NEXT_NODES: &[&str] = &[
    "greeting",
    "question",
    "followup",
    "sandbox_guidance",
    "code_review",
    "evaluation",
    "closing",
];

impl OutputSchema for NextNodeSchema {
    fn name(&self) -> &'static str {
        "next_node"
    }

    fn validate(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|o| o.get("next_node"))
            .and_then(Value::as_str)
            .is_some_and(|s| NEXT_NODES.contains(&s))
    }
}

/// A plain spoken `{message}` payload, the common shape for most action
/// nodes' generated text.
pub struct MessageSchema;

impl OutputSchema for MessageSchema {
    fn name(&self) -> &'static str {
        "message"
    }

    fn validate(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|o| o.get("message"))
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    }
}

/// `{question, resume_anchor?}` expected from `question`/`followup`.
pub struct QuestionSchema;

impl OutputSchema for QuestionSchema {
    fn name(&self) -> &'static str {
        "question"
    }

    fn validate(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|o| o.get("question"))
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    }
}

/// `{message, exercise_description?, starter_code?, hints?}` expected from
/// `sandbox_guidance`.
pub struct SandboxGuidanceSchema;

impl OutputSchema for SandboxGuidanceSchema {
    fn name(&self) -> &'static str {
        "sandbox_guidance"
    }

    fn validate(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|o| o.get("message"))
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    }
}

/// `{message, quality: {summary, strengths?, concerns?, score?}}` expected
/// from `code_review`.
pub struct CodeReviewSchema;

impl OutputSchema for CodeReviewSchema {
    fn name(&self) -> &'static str {
        "code_review"
    }

    fn validate(&self, value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return false;
        };
        let message_ok = obj
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        let quality_ok = obj
            .get("quality")
            .and_then(Value::as_object)
            .and_then(|q| q.get("summary"))
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        message_ok && quality_ok
    }
}

/// `{message, assessments: [{skill, score, notes}], overall_summary}`
/// expected from `evaluation` (SPEC_FULL.md supplemental #3).
pub struct EvaluationSchema;

impl OutputSchema for EvaluationSchema {
    fn name(&self) -> &'static str {
        "evaluation"
    }

    fn validate(&self, value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return false;
        };
        let message_ok = obj
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        let assessments_ok = obj
            .get("assessments")
            .and_then(Value::as_array)
            .is_some_and(|arr| {
                arr.iter().all(|a| {
                    a.as_object().is_some_and(|o| {
                        o.get("skill").and_then(Value::as_str).is_some()
                            && o.get("score").and_then(Value::as_f64).is_some()
                    })
                })
            });
        message_ok && assessments_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intent_schema_rejects_unknown_type() {
        let v = json!({"type": "teleport", "confidence": 0.9});
        assert!(!IntentSchema.validate(&v));
    }

    #[test]
    fn intent_schema_rejects_out_of_range_confidence() {
        let v = json!({"type": "stop", "confidence": 1.5});
        assert!(!IntentSchema.validate(&v));
    }

    #[test]
    fn intent_schema_accepts_valid_payload() {
        let v = json!({"type": "stop", "confidence": 0.95});
        assert!(IntentSchema.validate(&v));
    }

    #[test]
    fn next_node_schema_rejects_unknown_value() {
        let v = json!({"next_node": "teleport"});
        assert!(!NextNodeSchema.validate(&v));
    }

    #[test]
    fn code_review_schema_requires_nested_quality_summary() {
        let missing = json!({"message": "looks ok"});
        assert!(!CodeReviewSchema.validate(&missing));
        let present = json!({"message": "looks ok", "quality": {"summary": "solid"}});
        assert!(CodeReviewSchema.validate(&present));
    }
}
