//! LM Client Adapter (spec §4.4): structured-output language-model
//! invocations with schema validation, retries and timeouts.

pub mod mock;
pub mod schema;

#[cfg(feature = "rig")]
pub mod rig;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backoff;
use crate::config::Config;

/// `mode ∈ {deterministic, creative}`: influences sampling temperature,
/// never correctness (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LmMode {
    Deterministic,
    Creative,
}

/// A validator for the tagged union / record an `LmRequest` expects back.
/// Kept as a trait object (rather than a generic) so [`LmBackend`] can
/// stay object-safe; nodes own the concrete schema and deserialize the
/// validated `Value` into their own typed struct afterward.
pub trait OutputSchema: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, value: &serde_json::Value) -> bool;
}

pub struct LmRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema: Arc<dyn OutputSchema>,
    pub mode: LmMode,
}

impl LmRequest {
    #[must_use]
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        schema: Arc<dyn OutputSchema>,
        mode: LmMode,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            schema,
            mode,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum LmError {
    #[error("language-model call timed out")]
    #[diagnostic(code(interview_engine::lm::timeout))]
    Timeout,

    #[error("language-model response failed schema validation for `{schema}` after retries")]
    #[diagnostic(code(interview_engine::lm::schema_failure))]
    SchemaFailure { schema: &'static str },

    #[error("language-model backend signaled rate limiting")]
    #[diagnostic(code(interview_engine::lm::rate_limited))]
    RateLimited,

    #[error("language-model backend error: {message}")]
    #[diagnostic(code(interview_engine::lm::backend))]
    Backend { message: String },
}

/// The raw, unretried backend a node ultimately calls through — a thin
/// seam so a mock, a `rig`-backed client, or a bare HTTP client can all
/// satisfy the same contract (spec §9 "global singletons" re-architecture:
/// explicit dependency, constructed once and passed in, never process-wide
/// state).
#[async_trait]
pub trait LmBackend: Send + Sync {
    async fn generate(&self, request: &LmRequest) -> Result<serde_json::Value, LmError>;
}

/// Wraps an [`LmBackend`] with the timeout/retry/backoff discipline spec
/// §4.4 and §5 require, so individual backends stay simple.
pub struct LmClient {
    backend: Arc<dyn LmBackend>,
    timeout: Duration,
}

impl LmClient {
    #[must_use]
    pub fn new(backend: Arc<dyn LmBackend>, config: &Config) -> Self {
        Self {
            backend,
            timeout: config.lm_timeout(),
        }
    }

    /// `call(system_prompt, user_prompt, output_schema, mode) →
    /// structured_value` (spec §4.4). Retries schema failures up to twice;
    /// retries rate-limit signals with the shared backoff schedule;
    /// any single attempt exceeding the configured timeout fails with
    /// [`LmError::Timeout`] without being retried further (spec: "after
    /// exhaustion, fails with `LMTimeout`" — a single, enforced attempt
    /// budget, not stacked with the schema-retry budget).
    #[tracing::instrument(skip_all, fields(schema = request.schema.name()))]
    pub async fn call(&self, request: LmRequest) -> Result<serde_json::Value, LmError> {
        const SCHEMA_RETRIES: u32 = 2;

        let mut last_err = LmError::SchemaFailure {
            schema: request.schema.name(),
        };

        for attempt in 0..=SCHEMA_RETRIES {
            let result = tokio::time::timeout(self.timeout, self.backend.generate(&request)).await;
            let value = match result {
                Ok(Ok(value)) => value,
                Ok(Err(LmError::RateLimited)) => {
                    if attempt < backoff::MAX_ATTEMPTS - 1 {
                        tokio::time::sleep(backoff::jittered_delay(attempt)).await;
                        continue;
                    }
                    return Err(LmError::RateLimited);
                }
                Ok(Err(e)) => return Err(e),
                Err(_elapsed) => return Err(LmError::Timeout),
            };

            if request.schema.validate(&value) {
                return Ok(value);
            }
            last_err = LmError::SchemaFailure {
                schema: request.schema.name(),
            };
            tracing::warn!(
                schema = request.schema.name(),
                attempt,
                "language-model response failed schema validation, retrying"
            );
        }

        Err(last_err)
    }
}
