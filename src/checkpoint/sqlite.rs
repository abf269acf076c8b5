//! SQLite-backed [`CheckpointStore`]: full step history, durable across
//! restarts. No `migrations/` directory ships with this crate, so the
//! schema is created inline with `CREATE TABLE IF NOT EXISTS` on connect
//! rather than via `sqlx::migrate!`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::{Checkpoint, CheckpointError, CheckpointStore, Result};

pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteCheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointStore").finish()
    }
}

impl SqliteCheckpointStore {
    /// Connect to (or create) a SQLite database at `database_url` and
    /// ensure the checkpoint table exists.
    ///
    /// Example URL: `sqlite://interview_engine.db`.
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| CheckpointError::Backend {
                message: format!("connect error: {e}"),
            })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                interview_id TEXT NOT NULL,
                version      INTEGER NOT NULL,
                state_json   TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                PRIMARY KEY (interview_id, version)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CheckpointError::Backend {
            message: format!("schema creation: {e}"),
        })?;

        Ok(Self { pool })
    }

    fn row_to_checkpoint(row: &sqlx::sqlite::SqliteRow) -> std::result::Result<Checkpoint, CheckpointError> {
        let interview_id: String = row.try_get("interview_id").map_err(backend_err)?;
        let version: i64 = row.try_get("version").map_err(backend_err)?;
        let state_json: String = row.try_get("state_json").map_err(backend_err)?;
        let created_at_raw: String = row.try_get("created_at").map_err(backend_err)?;
        let created_at: DateTime<Utc> = created_at_raw
            .parse()
            .map_err(|e| CheckpointError::Backend {
                message: format!("bad timestamp: {e}"),
            })?;
        Ok(Checkpoint {
            interview_id,
            version: version as u64,
            encoded_state: state_json,
            created_at,
        })
    }
}

fn backend_err(e: sqlx::Error) -> CheckpointError {
    CheckpointError::Backend { message: e.to_string() }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn save(&self, interview_id: &str, state: &crate::state::InterviewState) -> Result<Checkpoint> {
        let encoded_state = state.encode()?;
        let mut tx = self.pool.begin().await.map_err(backend_err)?;

        let row = sqlx::query("SELECT COALESCE(MAX(version), 0) AS max_version FROM checkpoints WHERE interview_id = ?1")
            .bind(interview_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend_err)?;
        let max_version: i64 = row.try_get("max_version").map_err(backend_err)?;
        let next_version = max_version + 1;
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO checkpoints (interview_id, version, state_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(interview_id)
        .bind(next_version)
        .bind(&encoded_state)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(backend_err)?;

        tx.commit().await.map_err(backend_err)?;

        Ok(Checkpoint {
            interview_id: interview_id.to_string(),
            version: next_version as u64,
            encoded_state,
            created_at,
        })
    }

    async fn load_latest(&self, interview_id: &str) -> Result<Option<Checkpoint>> {
        let row = sqlx::query(
            "SELECT interview_id, version, state_json, created_at FROM checkpoints \
             WHERE interview_id = ?1 ORDER BY version DESC LIMIT 1",
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.as_ref().map(Self::row_to_checkpoint).transpose()
    }

    async fn load_version(&self, interview_id: &str, version: u64) -> Result<Option<Checkpoint>> {
        let row = sqlx::query(
            "SELECT interview_id, version, state_json, created_at FROM checkpoints \
             WHERE interview_id = ?1 AND version = ?2",
        )
        .bind(interview_id)
        .bind(version as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.as_ref().map(Self::row_to_checkpoint).transpose()
    }

    async fn list_versions(&self, interview_id: &str) -> Result<Vec<u64>> {
        let rows = sqlx::query("SELECT version FROM checkpoints WHERE interview_id = ?1 ORDER BY version ASC")
            .bind(interview_id)
            .fetch_all(&self.pool)
            .await
            .map_err(backend_err)?;

        rows.iter()
            .map(|r| r.try_get::<i64, _>("version").map(|v| v as u64).map_err(backend_err))
            .collect()
    }

    async fn purge(&self, interview_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM checkpoints WHERE interview_id = ?1")
            .bind(interview_id)
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn purge_before(&self, interview_id: &str, keep_from_version: u64) -> Result<()> {
        sqlx::query("DELETE FROM checkpoints WHERE interview_id = ?1 AND version < ?2")
            .bind(interview_id)
            .bind(keep_from_version as i64)
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
