//! Shared fixtures for the integration suite, mirroring the teacher's
//! `tests/common/` layout (`fixtures.rs`, `nodes.rs`, `testing.rs`).

use std::sync::Arc;

use interview_engine::checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use interview_engine::config::Config;
use interview_engine::event_bus::EventHub;
use interview_engine::graph::GraphRuntime;
use interview_engine::lm::mock::MockLmBackend;
use interview_engine::lm::LmClient;
use interview_engine::nodes::NodeRegistry;
use interview_engine::sandbox::mock::MockSandboxBackend;
use interview_engine::sandbox::SandboxClient;

/// A [`GraphRuntime`] wired to the in-process mock LM/sandbox backends,
/// matching the defaults every node unit test already uses.
#[must_use]
pub fn mock_runtime() -> GraphRuntime {
    mock_runtime_with_config(&Config::default())
}

#[must_use]
pub fn mock_runtime_with_config(config: &Config) -> GraphRuntime {
    let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), config));
    let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), config));
    GraphRuntime::new(NodeRegistry::new(lm, sandbox, config))
}

#[must_use]
pub fn hub() -> Arc<EventHub> {
    EventHub::new(256)
}

#[must_use]
pub fn checkpoint_store() -> Arc<dyn CheckpointStore> {
    Arc::new(InMemoryCheckpointStore::new())
}
