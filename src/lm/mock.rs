//! The in-process mock LM backend used by default and by tests: no network,
//! deterministic output keyed off the requested schema and prompt content.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{LmBackend, LmError, LmRequest};

#[derive(Debug, Default)]
pub struct MockLmBackend;

#[async_trait]
impl LmBackend for MockLmBackend {
    async fn generate(&self, request: &LmRequest) -> Result<Value, LmError> {
        Ok(match request.schema.name() {
            "intent" => mock_intent(&request.user_prompt),
            "next_node" => json!({"next_node": "question"}),
            "question" => json!({"question": "Tell me about a project you're proud of."}),
            "sandbox_guidance" => json!({
                "message": "Let's write some code together. Head over to the editor.",
                "exercise_description": "Implement a function that reverses a linked list.",
                "starter_code": "def reverse_list(head):\n    pass\n",
                "hints": ["Track the previous node", "Watch for the null terminator"],
            }),
            "code_review" => json!({
                "message": "Your solution runs and handles the base case correctly.",
                "quality": {
                    "summary": "Correct, iterative approach with clear variable names.",
                    "strengths": ["Handles empty input", "O(n) time"],
                    "concerns": [],
                    "score": 0.85,
                },
            }),
            "evaluation" => json!({
                "message": "Overall a strong technical performance across the session.",
                "assessments": [
                    {"skill": "problem solving", "score": 0.8, "notes": "Structured approach"},
                    {"skill": "coding", "score": 0.75, "notes": "Clean, idiomatic code"},
                ],
                "overall_summary": "Solid candidate, recommend advancing.",
            }),
            _ => json!({"message": "Thanks for sharing that."}),
        })
    }
}

fn mock_intent(user_prompt: &str) -> Value {
    let lowered = user_prompt.to_lowercase();
    let (kind, confidence) = if lowered.contains("end the interview") || lowered.contains("let's stop")
    {
        ("stop", 0.95)
    } else if lowered.contains("write some code") || lowered.contains("let me code") {
        ("write_code", 0.9)
    } else if lowered.is_empty() {
        ("no_intent", 0.0)
    } else {
        ("continue", 0.5)
    };
    json!({"type": kind, "confidence": confidence})
}
