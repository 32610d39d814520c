//! Repository for the `content_metadata` table.

use coursehub_core::snapshot::MetadataSnapshot;
use coursehub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::metadata::ContentMetadata;

/// Column list shared across queries to avoid repetition.
pub(crate) const METADATA_COLUMNS: &str = "id, content_id, subject, topic, \
    difficulty, duration, prerequisites, created_at, updated_at";

/// Provides upsert and read operations for the content metadata sub-record.
pub struct MetadataRepo;

impl MetadataRepo {
    /// Upsert the metadata record for a content item.
    ///
    /// Creates the row if absent, otherwise overwrites all metadata
    /// fields with the given values.
    pub async fn upsert_in(
        conn: &mut PgConnection,
        content_id: DbId,
        fields: &MetadataSnapshot,
    ) -> Result<ContentMetadata, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_metadata \
                (content_id, subject, topic, difficulty, duration, prerequisites) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (content_id) \
             DO UPDATE SET \
                subject = EXCLUDED.subject, \
                topic = EXCLUDED.topic, \
                difficulty = EXCLUDED.difficulty, \
                duration = EXCLUDED.duration, \
                prerequisites = EXCLUDED.prerequisites \
             RETURNING {METADATA_COLUMNS}"
        );
        sqlx::query_as::<_, ContentMetadata>(&query)
            .bind(content_id)
            .bind(&fields.subject)
            .bind(&fields.topic)
            .bind(&fields.difficulty)
            .bind(fields.duration)
            .bind(&fields.prerequisites)
            .fetch_one(conn)
            .await
    }

    /// Upsert the metadata record for a content item.
    pub async fn upsert(
        pool: &PgPool,
        content_id: DbId,
        fields: &MetadataSnapshot,
    ) -> Result<ContentMetadata, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::upsert_in(&mut conn, content_id, fields).await
    }

    /// Find the metadata record for a content item, if any.
    pub async fn find_by_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Option<ContentMetadata>, sqlx::Error> {
        let query = format!(
            "SELECT {METADATA_COLUMNS} FROM content_metadata WHERE content_id = $1"
        );
        sqlx::query_as::<_, ContentMetadata>(&query)
            .bind(content_id)
            .fetch_optional(pool)
            .await
    }
}
