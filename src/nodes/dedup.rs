//! Duplicate-question detection (spec §4.3 edge cases, §8 testable
//! properties): normalize, strip punctuation, and reject a candidate
//! question whose token overlap with any existing question is at or above
//! the configured threshold.

use crate::records::QuestionRecord;

fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Fraction of `candidate`'s tokens that also appear in `existing`, over
/// the size of the smaller token set — a symmetric-ish overlap measure
/// that makes a short question fully contained in a longer one still
/// count as near-duplicate.
#[must_use]
pub fn token_overlap(a: &str, b: &str) -> f32 {
    use std::collections::HashSet;

    let tokens_a: HashSet<String> = normalize(a).into_iter().collect();
    let tokens_b: HashSet<String> = normalize(b).into_iter().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let smaller = tokens_a.len().min(tokens_b.len());
    intersection as f32 / smaller as f32
}

/// Whether `candidate` is too similar to any already-asked question.
#[must_use]
pub fn is_duplicate(candidate: &str, existing: &[QuestionRecord], threshold: f32) -> bool {
    existing
        .iter()
        .any(|q| token_overlap(candidate, &q.text) >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::QuestionSource;

    fn question(text: &str) -> QuestionRecord {
        QuestionRecord {
            question_id: "q1".to_string(),
            text: text.to_string(),
            source: QuestionSource::Question,
            asked_at_turn: 1,
            resume_anchor: None,
        }
    }

    #[test]
    fn identical_text_is_fully_overlapping() {
        assert_eq!(token_overlap("Tell me about Acme", "Tell me about Acme"), 1.0);
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let overlap = token_overlap("Tell me about Acme!", "tell me about acme");
        assert_eq!(overlap, 1.0);
    }

    #[test]
    fn unrelated_questions_have_low_overlap() {
        let overlap = token_overlap(
            "Tell me about your experience at Acme",
            "What is your favorite color",
        );
        assert!(overlap < 0.3);
    }

    #[test]
    fn is_duplicate_respects_threshold() {
        let existing = vec![question("Tell me about your project at Acme")];
        assert!(is_duplicate(
            "Tell me about your project at Acme Corp",
            &existing,
            0.8
        ));
        assert!(!is_duplicate("What languages do you know", &existing, 0.8));
    }
}
