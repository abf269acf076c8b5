//! Sandbox Client (spec §4.5): submits `{code, language}` to the external
//! code executor and enforces the client-side caps the spec names in
//! addition to whatever the executor itself enforces.

pub mod mock;
#[cfg(feature = "http")]
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::records::{ExecutionResult, Language};

#[derive(Debug, Error, Diagnostic)]
pub enum SandboxError {
    #[error("submitted code exceeds the {max_bytes} byte cap")]
    #[diagnostic(code(interview_engine::sandbox::code_too_large))]
    CodeTooLarge { max_bytes: usize },

    #[error("unsupported language: {language}")]
    #[diagnostic(code(interview_engine::sandbox::unsupported_language))]
    UnsupportedLanguage { language: String },

    #[error("sandbox executor unreachable: {message}")]
    #[diagnostic(code(interview_engine::sandbox::unavailable))]
    Unavailable { message: String },
}

/// Validate a raw `{code, language}` submission before it ever reaches the
/// executor (spec §8 boundary behavior: rejected before the sandbox call).
pub fn validate_submission(code: &str, language: &str, config: &Config) -> Result<Language, SandboxError> {
    if code.len() > config.code_max_bytes {
        return Err(SandboxError::CodeTooLarge {
            max_bytes: config.code_max_bytes,
        });
    }
    Language::parse(language).ok_or_else(|| SandboxError::UnsupportedLanguage {
        language: language.to_string(),
    })
}

/// The raw executor seam: given validated code and language, run it and
/// report back. Caps beyond this point (truncation, wall-clock) are the
/// client's job, not the backend's.
#[async_trait]
pub trait SandboxBackend: Send + Sync {
    async fn execute(&self, code: &str, language: Language) -> Result<ExecutionResult, SandboxError>;
}

pub struct SandboxClient {
    backend: Arc<dyn SandboxBackend>,
    timeout: std::time::Duration,
    truncate_bytes: usize,
}

impl SandboxClient {
    #[must_use]
    pub fn new(backend: Arc<dyn SandboxBackend>, config: &Config) -> Self {
        Self {
            backend,
            timeout: config.sandbox_timeout(),
            truncate_bytes: config.output_truncate_bytes,
        }
    }

    /// Submit validated code for execution. Never returns `Err`: executor
    /// unavailability and timeouts degrade into a synthetic
    /// [`ExecutionResult`] (spec §4.5 failure modes) so `code_review` can
    /// proceed and simply note the degradation in its feedback.
    #[tracing::instrument(skip(self, code))]
    pub async fn submit(&self, code: &str, language: Language) -> ExecutionResult {
        let outcome = tokio::time::timeout(self.timeout, self.backend.execute(code, language)).await;

        let mut result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(SandboxError::Unavailable { message })) => {
                warn!(%message, "sandbox executor unavailable, synthesizing error result");
                ExecutionResult {
                    stdout: String::new(),
                    stderr: format!("sandbox unavailable: {message}"),
                    exit_code: -1,
                    elapsed_ms: 0,
                    timed_out: false,
                    stdout_truncated: false,
                    stderr_truncated: false,
                    unavailable: true,
                }
            }
            Ok(Err(other)) => ExecutionResult {
                stdout: String::new(),
                stderr: other.to_string(),
                exit_code: -1,
                elapsed_ms: 0,
                timed_out: false,
                stdout_truncated: false,
                stderr_truncated: false,
                unavailable: true,
            },
            Err(_elapsed) => ExecutionResult {
                stdout: String::new(),
                stderr: "execution exceeded the configured wall-clock limit".to_string(),
                exit_code: 1,
                elapsed_ms: self.timeout.as_millis() as u64,
                timed_out: true,
                stdout_truncated: false,
                stderr_truncated: false,
                unavailable: false,
            },
        };

        truncate_field(&mut result.stdout, &mut result.stdout_truncated, self.truncate_bytes);
        truncate_field(&mut result.stderr, &mut result.stderr_truncated, self.truncate_bytes);
        result
    }
}

fn truncate_field(field: &mut String, truncated_flag: &mut bool, max_bytes: usize) {
    if field.len() > max_bytes {
        let mut cut = max_bytes;
        while !field.is_char_boundary(cut) {
            cut -= 1;
        }
        field.truncate(cut);
        *truncated_flag = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_submission_rejects_oversized_code() {
        let config = Config {
            code_max_bytes: 4,
            ..Config::default()
        };
        let err = validate_submission("12345", "python", &config).unwrap_err();
        assert!(matches!(err, SandboxError::CodeTooLarge { .. }));
    }

    #[test]
    fn validate_submission_rejects_unknown_language() {
        let config = Config::default();
        let err = validate_submission("print(1)", "ruby", &config).unwrap_err();
        assert!(matches!(err, SandboxError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn truncate_field_sets_flag_only_when_over_cap() {
        let mut small = "hi".to_string();
        let mut flag = false;
        truncate_field(&mut small, &mut flag, 10);
        assert!(!flag);

        let mut big = "x".repeat(20);
        let mut flag2 = false;
        truncate_field(&mut big, &mut flag2, 10);
        assert!(flag2);
        assert_eq!(big.len(), 10);
    }
}
