//! A `reqwest`-backed [`SandboxBackend`] for a real external executor
//! (feature `http`, default-off).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SandboxBackend, SandboxError};
use crate::records::{ExecutionResult, Language};

pub struct HttpSandboxBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSandboxBackend {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    code: &'a str,
    language: &'static str,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    stdout: String,
    stderr: String,
    exit_code: i32,
    elapsed_ms: u64,
}

#[async_trait]
impl SandboxBackend for HttpSandboxBackend {
    async fn execute(&self, code: &str, language: Language) -> Result<ExecutionResult, SandboxError> {
        let language_str = match language {
            Language::Python => "python",
            Language::Javascript => "javascript",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ExecuteRequest {
                code,
                language: language_str,
            })
            .send()
            .await
            .map_err(|e| SandboxError::Unavailable {
                message: e.to_string(),
            })?;

        let body: ExecuteResponse = response.json().await.map_err(|e| SandboxError::Unavailable {
            message: e.to_string(),
        })?;

        Ok(ExecutionResult {
            stdout: body.stdout,
            stderr: body.stderr,
            exit_code: body.exit_code,
            elapsed_ms: body.elapsed_ms,
            timed_out: false,
            stdout_truncated: false,
            stderr_truncated: false,
            unavailable: false,
        })
    }
}
