//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PersistenceBackend` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use scrollnet_core::domain::{
    FeedbackWrite, InteractionPayload, InteractionWrite, StoreIdentity, VideoDescriptor,
};
use scrollnet_core::ports::{PersistenceBackend, PortError, PortResult};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::num::NonZeroU32;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PersistenceBackend` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    cadence: NonZeroU32,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`. `cadence` drives the server-side feedback check.
    pub fn new(pool: PgPool, cadence: NonZeroU32) -> Self {
        Self { pool, cadence }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn map_db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(e.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::Rejected(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// JSONB representation of an interaction payload.
fn payload_json(payload: &InteractionPayload) -> Option<serde_json::Value> {
    match payload {
        InteractionPayload::None => None,
        InteractionPayload::Emoji { key } => Some(json!({ "emoji": key.as_str() })),
        InteractionPayload::View { duration_ms } => Some(json!({ "durationMs": duration_ms })),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct VideoRecord {
    id: String,
    title: String,
    description: String,
    source_url: String,
    duration_seconds: i32,
    tags: Vec<String>,
    thumbnail_url: Option<String>,
}
impl VideoRecord {
    fn to_domain(self) -> VideoDescriptor {
        VideoDescriptor {
            id: self.id,
            title: self.title,
            description: self.description,
            source_url: self.source_url,
            duration_seconds: self.duration_seconds.max(0) as u32,
            tags: self.tags,
            thumbnail_url: self.thumbnail_url,
        }
    }
}

//=========================================================================================
// `PersistenceBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceBackend for DbAdapter {
    async fn list_videos(&self, offset: usize, limit: usize) -> PortResult<Vec<VideoDescriptor>> {
        let offset = i64::try_from(offset)
            .map_err(|_| PortError::Rejected(format!("offset {} is out of range", offset)))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let records = sqlx::query_as::<_, VideoRecord>(
            "SELECT id, title, description, source_url, duration_seconds, tags, thumbnail_url \
             FROM videos WHERE is_active \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn upsert_interaction(&self, write: InteractionWrite) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO interactions \
                 (id, user_id, anonymous_id, video_id, type, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             ON CONFLICT ON CONSTRAINT interactions_identity_video_type \
             DO UPDATE SET data = EXCLUDED.data, \
                           created_at = EXCLUDED.created_at, \
                           updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(write.identity.user_id())
        .bind(write.identity.anonymous_id())
        .bind(&write.video_id)
        .bind(write.kind.as_str())
        .bind(payload_json(&write.payload))
        .bind(write.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        debug!(video_id = %write.video_id, kind = %write.kind, "interaction upserted");
        Ok(())
    }

    async fn insert_feedback(&self, write: FeedbackWrite) -> PortResult<()> {
        let answers = serde_json::to_value(&write.answers)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            "INSERT INTO feedback (id, user_id, anonymous_id, video_id, answers, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(write.id)
        .bind(write.identity.user_id())
        .bind(write.identity.anonymous_id())
        .bind(&write.video_id)
        .bind(answers)
        .bind(write.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn feedback_required(&self, identity: StoreIdentity) -> PortResult<bool> {
        let consumed: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT i.video_id) FROM interactions i \
             WHERE i.user_id IS NOT DISTINCT FROM $1 \
               AND i.anonymous_id IS NOT DISTINCT FROM $2 \
               AND i.updated_at > COALESCE( \
                   (SELECT MAX(f.created_at) FROM feedback f \
                     WHERE f.user_id IS NOT DISTINCT FROM $1 \
                       AND f.anonymous_id IS NOT DISTINCT FROM $2), \
                   '-infinity'::timestamptz)",
        )
        .bind(identity.user_id())
        .bind(identity.anonymous_id())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(consumed >= i64::from(self.cadence.get()))
    }
}
