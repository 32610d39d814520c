//! Repository for the `content_versions` table: snapshot building,
//! version-number allocation, the append-only version log, and restore.
//!
//! Version numbers per content item are `1..N` with no gaps. Allocation
//! always happens inside the same transaction as the insert, backed by
//! the `uq_content_versions_content_id_version` constraint: a writer that
//! loses a race gets a unique violation and retries the whole
//! transaction with a freshly computed number. Exhausted retries surface
//! the violation to the caller, where it maps to a conflict error.

use coursehub_core::snapshot::{self, ContentSnapshot, MetadataSnapshot};
use coursehub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::content::Content;
use crate::models::content_version::ContentVersion;
use crate::repositories::content_repo::CONTENT_COLUMNS;
use crate::repositories::tag_repo::TagRepo;

/// Column list for content_versions queries.
const VERSION_COLUMNS: &str =
    "id, content_id, version, snapshot, change_note, created_by, created_at";

/// How many times a version insert is attempted before the unique
/// violation is surfaced to the caller.
pub(crate) const MAX_VERSION_INSERT_ATTEMPTS: u32 = 3;

/// Whether an error is a unique violation on the per-content version
/// number, i.e. a concurrent writer won the race for this number.
pub(crate) fn is_version_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_content_versions_content_id_version")
        }
        _ => false,
    }
}

/// Provides snapshot building and version-log operations.
pub struct VersionRepo;

impl VersionRepo {
    // -----------------------------------------------------------------------
    // Transaction-participating primitives
    // -----------------------------------------------------------------------

    /// Build a snapshot of a content item's current state: core fields,
    /// metadata sub-record, and tag names.
    ///
    /// Read-only. Returns `Ok(None)` if the content row does not exist.
    /// Inside a transaction this sees that transaction's own writes, so
    /// a mutation followed by a snapshot in the same transaction always
    /// captures the post-write state.
    pub async fn build_snapshot_in(
        conn: &mut PgConnection,
        content_id: DbId,
    ) -> Result<Option<ContentSnapshot>, sqlx::Error> {
        let row: Option<(String, Option<String>, String, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT title, body, content_type, resource_url, hierarchy_id \
                 FROM contents WHERE id = $1",
            )
            .bind(content_id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some((title, body, content_type, resource_url, hierarchy_id)) = row else {
            return Ok(None);
        };

        let metadata: Option<MetadataSnapshot> = sqlx::query_as::<_, MetadataRow>(
            "SELECT subject, topic, difficulty, duration, prerequisites \
             FROM content_metadata WHERE content_id = $1",
        )
        .bind(content_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(MetadataRow::into_snapshot);

        let tags = TagRepo::names_for_content_in(&mut *conn, content_id).await?;

        Ok(Some(ContentSnapshot {
            title,
            body,
            content_type,
            resource_url,
            hierarchy_id,
            metadata,
            tags,
        }))
    }

    /// Get the next version number for a content item (max existing + 1,
    /// or 1 if none). Only meaningful inside the transaction that also
    /// performs the insert.
    pub async fn next_version_in(
        conn: &mut PgConnection,
        content_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) + 1 \
             FROM content_versions WHERE content_id = $1",
        )
        .bind(content_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Insert one immutable version row with an explicit version number.
    pub async fn insert_in(
        conn: &mut PgConnection,
        content_id: DbId,
        version: i32,
        snapshot: &ContentSnapshot,
        change_note: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<ContentVersion, sqlx::Error> {
        let blob = serde_json::to_value(snapshot).map_err(|e| sqlx::Error::Encode(e.into()))?;
        let query = format!(
            "INSERT INTO content_versions \
                (content_id, version, snapshot, change_note, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {VERSION_COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(content_id)
            .bind(version)
            .bind(blob)
            .bind(change_note)
            .bind(created_by)
            .fetch_one(conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Pool-facing operations
    // -----------------------------------------------------------------------

    /// Build a snapshot of a content item's current committed state.
    pub async fn build_snapshot(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Option<ContentSnapshot>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::build_snapshot_in(&mut conn, content_id).await
    }

    /// Get the next version number for a content item.
    pub async fn next_version(pool: &PgPool, content_id: DbId) -> Result<i32, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::next_version_in(&mut conn, content_id).await
    }

    /// Snapshot the current state of a content item and append it as the
    /// next version, in one transaction, retrying on version-number races.
    ///
    /// Returns `Ok(None)` if the content no longer exists.
    pub async fn record_change(
        pool: &PgPool,
        content_id: DbId,
        change_note: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            let Some(snapshot) = Self::build_snapshot_in(&mut tx, content_id).await? else {
                return Ok(None);
            };
            let version = Self::next_version_in(&mut tx, content_id).await?;

            match Self::insert_in(&mut tx, content_id, version, &snapshot, change_note, created_by)
                .await
            {
                Ok(created) => {
                    tx.commit().await?;
                    return Ok(Some(created));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// List versions for a content item, newest first.
    pub async fn list_by_content(
        pool: &PgPool,
        content_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM content_versions \
             WHERE content_id = $1 \
             ORDER BY version DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(content_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a specific version of a content item.
    pub async fn find_by_content_and_version(
        pool: &PgPool,
        content_id: DbId,
        version: i32,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM content_versions \
             WHERE content_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(content_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// Find a version by its own id.
    pub async fn find_by_id(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!("SELECT {VERSION_COLUMNS} FROM content_versions WHERE id = $1");
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(version_id)
            .fetch_optional(pool)
            .await
    }

    /// Restore a content item to the state captured in `target`,
    /// appending a new version that documents the restore.
    ///
    /// One transaction covering all four sub-resources:
    ///
    /// 1. Overwrite the restorable content fields. Archival state is
    ///    always cleared: a restore brings content back to a live state.
    /// 2. Upsert the metadata sub-record when the snapshot captured one;
    ///    a snapshot without metadata leaves existing metadata untouched.
    /// 3. Replace all tag associations with the snapshot's tag set.
    /// 4. Append the new version row with change note
    ///    `Restored from version {source_version}`.
    ///
    /// Any failure rolls the whole transaction back; partial restores are
    /// never observable. Returns `Ok(None)` if the content row is gone.
    pub async fn restore_from_version(
        pool: &PgPool,
        content_id: DbId,
        target: &ContentSnapshot,
        source_version: i32,
        restored_by: Option<DbId>,
    ) -> Result<Option<Content>, sqlx::Error> {
        let change_note = snapshot::restore_change_note(source_version);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            let update_query = format!(
                "UPDATE contents SET \
                    title = $2, \
                    body = $3, \
                    content_type = $4, \
                    resource_url = $5, \
                    hierarchy_id = $6, \
                    is_archived = false, \
                    archived_at = NULL \
                 WHERE id = $1 \
                 RETURNING {CONTENT_COLUMNS}"
            );
            let Some(content) = sqlx::query_as::<_, Content>(&update_query)
                .bind(content_id)
                .bind(&target.title)
                .bind(&target.body)
                .bind(&target.content_type)
                .bind(&target.resource_url)
                .bind(&target.hierarchy_id)
                .fetch_optional(&mut *tx)
                .await?
            else {
                return Ok(None);
            };

            if let Some(metadata) = &target.metadata {
                super::MetadataRepo::upsert_in(&mut tx, content_id, metadata).await?;
            }

            TagRepo::replace_for_content_in(&mut tx, content_id, &target.tags).await?;

            let version = Self::next_version_in(&mut tx, content_id).await?;
            match Self::insert_in(
                &mut tx,
                content_id,
                version,
                target,
                Some(&change_note),
                restored_by,
            )
            .await
            {
                Ok(_) => {
                    tx.commit().await?;
                    tracing::info!(content_id, version, source_version, "Content restored");
                    return Ok(Some(content));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Row shape for the metadata portion of a snapshot read.
#[derive(sqlx::FromRow)]
struct MetadataRow {
    subject: Option<String>,
    topic: Option<String>,
    difficulty: Option<String>,
    duration: Option<i32>,
    prerequisites: Option<String>,
}

impl MetadataRow {
    fn into_snapshot(self) -> MetadataSnapshot {
        MetadataSnapshot {
            subject: self.subject,
            topic: self.topic,
            difficulty: self.difficulty,
            duration: self.duration,
            prerequisites: self.prerequisites,
        }
    }
}
