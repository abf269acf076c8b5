//! Intent & Decision Policy (spec §4.8, C8): the ordered rules layered on
//! top of the language model's routing suggestion.
//!
//! This is the one place spec §9's Open Question about "recent answer
//! quality indicates sufficient coverage" had to be resolved by decision
//! rather than by inspecting source behavior (see `DESIGN.md`): a run is
//! judged to have sufficient coverage when the most recent `answer_quality`
//! sample is at least 0.6, a plain midpoint-and-above reading consistent
//! with the rest of the policy's conservative defaults.

use crate::records::{IntentType, NextNode};
use crate::state::ControlFields;

/// Threshold for "sufficient coverage" used by policy rule 5. Not part of
/// spec §6's enumerated configuration (which only names the turn-count
/// threshold), so it is a module constant rather than a `Config` field.
pub const SUFFICIENT_COVERAGE_QUALITY: f32 = 0.6;

/// Apply the ordered policy rules (spec §4.8) on top of the language
/// model's suggested `next_node`, given the evaluation-turn-count
/// threshold from configuration.
#[must_use]
pub fn decide_next_node(
    control: &ControlFields,
    lm_suggestion: NextNode,
    evaluation_turn_threshold: u32,
) -> NextNode {
    if let Some(request) = &control.active_user_request {
        match request.kind {
            IntentType::WriteCode | IntentType::UseSandbox => return NextNode::SandboxGuidance,
            IntentType::ReviewCode | IntentType::CodeWalkthrough | IntentType::ShowCode => {
                return if control.current_code.is_some() {
                    NextNode::CodeReview
                } else {
                    NextNode::SandboxGuidance
                };
            }
            IntentType::Stop => return NextNode::Closing,
            _ => {}
        }
    }

    let coverage_sufficient = control
        .answer_quality
        .is_some_and(|q| q >= SUFFICIENT_COVERAGE_QUALITY);
    if control.turn_count >= evaluation_turn_threshold && coverage_sufficient {
        return NextNode::Evaluation;
    }

    lm_suggestion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::IntentRecord;

    fn base_control() -> ControlFields {
        ControlFields::default()
    }

    #[test]
    fn stop_intent_always_routes_to_closing() {
        let mut control = base_control();
        control.active_user_request = Some(IntentRecord {
            kind: IntentType::Stop,
            confidence: 0.9,
            extracted_from_turn: 1,
            payload: None,
        });
        assert_eq!(
            decide_next_node(&control, NextNode::Question, 20),
            NextNode::Closing
        );
    }

    #[test]
    fn write_code_intent_routes_to_sandbox_guidance() {
        let mut control = base_control();
        control.active_user_request = Some(IntentRecord {
            kind: IntentType::WriteCode,
            confidence: 0.8,
            extracted_from_turn: 1,
            payload: None,
        });
        assert_eq!(
            decide_next_node(&control, NextNode::Question, 20),
            NextNode::SandboxGuidance
        );
    }

    #[test]
    fn review_code_without_code_falls_back_to_sandbox_guidance() {
        let mut control = base_control();
        control.active_user_request = Some(IntentRecord {
            kind: IntentType::ReviewCode,
            confidence: 0.8,
            extracted_from_turn: 1,
            payload: None,
        });
        assert_eq!(
            decide_next_node(&control, NextNode::Question, 20),
            NextNode::SandboxGuidance
        );
    }

    #[test]
    fn review_code_with_code_routes_to_code_review() {
        let mut control = base_control();
        control.current_code = Some("print(1)".to_string());
        control.active_user_request = Some(IntentRecord {
            kind: IntentType::ReviewCode,
            confidence: 0.8,
            extracted_from_turn: 1,
            payload: None,
        });
        assert_eq!(
            decide_next_node(&control, NextNode::Question, 20),
            NextNode::CodeReview
        );
    }

    #[test]
    fn sufficient_turns_and_quality_routes_to_evaluation() {
        let mut control = base_control();
        control.turn_count = 21;
        control.answer_quality = Some(0.7);
        assert_eq!(
            decide_next_node(&control, NextNode::Question, 20),
            NextNode::Evaluation
        );
    }

    #[test]
    fn insufficient_quality_falls_through_to_lm_suggestion() {
        let mut control = base_control();
        control.turn_count = 21;
        control.answer_quality = Some(0.2);
        assert_eq!(
            decide_next_node(&control, NextNode::Followup, 20),
            NextNode::Followup
        );
    }

    #[test]
    fn no_active_request_defers_entirely_to_lm_suggestion() {
        let control = base_control();
        assert_eq!(
            decide_next_node(&control, NextNode::Closing, 20),
            NextNode::Closing
        );
    }
}
