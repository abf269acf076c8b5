//! A `rig-core`-backed [`LmBackend`] for production deployments (feature
//! `rig`, default-off; the default backend is [`super::mock::MockLmBackend`]).

use async_trait::async_trait;
use rig::completion::Prompt;
use serde_json::Value;

use super::{LmBackend, LmError, LmRequest};

/// Wraps a `rig` completion model. Construction is left to the embedding
/// application (API keys, model choice); this adapter only owns the
/// request/response shape, not client lifecycle (spec §9: explicit
/// dependency injection, never process-wide singleton state).
pub struct RigLmBackend<M> {
    model: M,
}

impl<M> RigLmBackend<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M> LmBackend for RigLmBackend<M>
where
    M: rig::completion::CompletionModel + Send + Sync,
{
    async fn generate(&self, request: &LmRequest) -> Result<Value, LmError> {
        let agent = rig::agent::AgentBuilder::new(self.model.clone())
            .preamble(&request.system_prompt)
            .build();

        let response = agent
            .prompt(request.user_prompt.as_str())
            .await
            .map_err(|e| LmError::Backend {
                message: e.to_string(),
            })?;

        serde_json::from_str(&response).map_err(|_| LmError::SchemaFailure {
            schema: request.schema.name(),
        })
    }
}
