//! Shared error-event envelope used for the diagnostic (not control-flow)
//! error stream: every component that can fail in a way worth logging but
//! not necessarily aborting the run appends one of these to the errors
//! channel (see [`crate::channels`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::telemetry::{PlainFormatter, TelemetryFormatter};

/// A single recorded failure or anomaly, scoped to the component that
/// raised it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: LadderError,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    pub fn node<S: Into<String>>(kind: S, step: u64, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                kind: kind.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn routing(step: u64, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Routing { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn coordinator<S: Into<String>>(interview_id: S, error: LadderError) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Coordinator {
                interview_id: interview_id.into(),
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Where an [`ErrorEvent`] originated. Tagged so the serialized form stays
/// stable across the channel's textual encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node { kind: String, step: u64 },
    Routing { step: u64 },
    Coordinator { interview_id: String },
    #[default]
    Graph,
}

/// A chainable, serializable error, distinct from `thiserror` enums: this
/// one rides inside state (and therefore must serialize), while the
/// `thiserror` enums in this crate are strictly in-process `Result` types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LadderError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<LadderError>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for LadderError {
    fn default() -> Self {
        LadderError {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for LadderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LadderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl LadderError {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        LadderError {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: LadderError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Render a slice of error events as human-readable text for logs.
pub fn pretty_print(events: &[ErrorEvent]) -> String {
    let formatter = PlainFormatter;
    let renders = formatter.render_errors(events);
    let mut out = String::new();
    for (idx, render) in renders.into_iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for line in render.lines {
            out.push_str(&line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_scope_round_trips() {
        let event = ErrorEvent::node("question", 3, LadderError::msg("boom")).with_tag("retry");
        let json = serde_json::to_string(&event).unwrap();
        let back: ErrorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn cause_chain_preserved() {
        let err = LadderError::msg("outer").with_cause(LadderError::msg("inner"));
        assert_eq!(err.cause.as_ref().unwrap().message, "inner");
    }
}
