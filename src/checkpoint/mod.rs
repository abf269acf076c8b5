//! Checkpoint Store (spec §4.2, C2): durable, versioned snapshots of
//! [`InterviewState`] between coordinator steps.
//!
//! Unlike the teacher's `Checkpointer` (latest-only per session, no
//! history), spec §4.2 requires full version history per interview so a
//! reconnect can replay or a prior version can be inspected — the in-memory
//! implementation here keeps every version ever saved, and the SQLite
//! implementation appends rather than replaces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::state::{CorruptStateError, InterviewState};

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Errors from checkpoint store operations.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum CheckpointError {
    #[error("no checkpoint found for interview {interview_id}")]
    #[diagnostic(code(interview_engine::checkpoint::not_found))]
    NotFound { interview_id: String },

    #[error("checkpoint version {version} not found for interview {interview_id}")]
    #[diagnostic(code(interview_engine::checkpoint::version_not_found))]
    VersionNotFound { interview_id: String, version: u64 },

    #[error("checkpoint state is corrupt: {0}")]
    #[diagnostic(code(interview_engine::checkpoint::corrupt))]
    Corrupt(#[from] CorruptStateError),

    #[error("checkpoint backend error: {message}")]
    #[diagnostic(code(interview_engine::checkpoint::backend))]
    Backend { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// One durable snapshot: the interview's fully self-describing encoding
/// (spec §4.1) plus the version number and the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub interview_id: String,
    pub version: u64,
    pub encoded_state: String,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Decode the stored blob back into a live [`InterviewState`].
    pub fn into_state(self) -> Result<InterviewState> {
        InterviewState::decode(&self.encoded_state).map_err(CheckpointError::Corrupt)
    }
}

/// Durable, versioned persistence for interview state (spec §4.2).
///
/// Implementations must treat `save` as append-only: every call creates a
/// new version rather than overwriting the previous one, so
/// `load_version` keeps working for any version ever saved (until pruned).
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist `state` as the next version for `interview_id` and return
    /// the checkpoint that was written (with its assigned version).
    async fn save(&self, interview_id: &str, state: &InterviewState) -> Result<Checkpoint>;

    /// The most recently saved checkpoint for an interview, if any.
    async fn load_latest(&self, interview_id: &str) -> Result<Option<Checkpoint>>;

    /// A specific historical version, if it still exists.
    async fn load_version(&self, interview_id: &str, version: u64) -> Result<Option<Checkpoint>>;

    /// All version numbers on file for an interview, ascending.
    async fn list_versions(&self, interview_id: &str) -> Result<Vec<u64>>;

    /// Discard every checkpoint for an interview (spec §4.2 cleanup).
    async fn purge(&self, interview_id: &str) -> Result<()>;

    /// Discard every version strictly older than `keep_from_version`
    /// (retention policy; spec §4.2 supplemental).
    async fn purge_before(&self, interview_id: &str, keep_from_version: u64) -> Result<()>;
}

/// Process-local, full-history checkpoint store. Suitable for tests and
/// embedding; does not survive a process restart.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    inner: parking_lot::RwLock<rustc_hash::FxHashMap<String, Vec<Checkpoint>>>,
}

impl InMemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, interview_id: &str, state: &InterviewState) -> Result<Checkpoint> {
        let encoded_state = state.encode()?;
        let mut map = self.inner.write();
        let versions = map.entry(interview_id.to_string()).or_default();
        let next_version = versions.last().map_or(1, |c| c.version + 1);
        let checkpoint = Checkpoint {
            interview_id: interview_id.to_string(),
            version: next_version,
            encoded_state,
            created_at: Utc::now(),
        };
        versions.push(checkpoint.clone());
        Ok(checkpoint)
    }

    async fn load_latest(&self, interview_id: &str) -> Result<Option<Checkpoint>> {
        let map = self.inner.read();
        Ok(map.get(interview_id).and_then(|v| v.last()).cloned())
    }

    async fn load_version(&self, interview_id: &str, version: u64) -> Result<Option<Checkpoint>> {
        let map = self.inner.read();
        Ok(map
            .get(interview_id)
            .and_then(|v| v.iter().find(|c| c.version == version))
            .cloned())
    }

    async fn list_versions(&self, interview_id: &str) -> Result<Vec<u64>> {
        let map = self.inner.read();
        Ok(map
            .get(interview_id)
            .map(|v| v.iter().map(|c| c.version).collect())
            .unwrap_or_default())
    }

    async fn purge(&self, interview_id: &str) -> Result<()> {
        self.inner.write().remove(interview_id);
        Ok(())
    }

    async fn purge_before(&self, interview_id: &str, keep_from_version: u64) -> Result<()> {
        let mut map = self.inner.write();
        if let Some(versions) = map.get_mut(interview_id) {
            versions.retain(|c| c.version >= keep_from_version);
        }
        Ok(())
    }
}
