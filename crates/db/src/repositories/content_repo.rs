//! Repository for the `contents` table.
//!
//! Every mutating operation here is a versioned operation: the mutation,
//! the post-write snapshot, and the version-log append run inside one
//! transaction, so the live state and the history can never drift apart.
//! Version-number races with concurrent writers are retried the same way
//! as in [`VersionRepo`].

use coursehub_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use coursehub_core::snapshot::{self, NOTE_ARCHIVED, NOTE_INITIAL_CREATION, NOTE_UNARCHIVED};
use coursehub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::content::{Content, ContentDetail, ContentListParams, CreateContent, UpdateContent};
use crate::models::metadata::ContentMetadata;
use crate::models::tag::AttachResult;
use crate::repositories::metadata_repo::{MetadataRepo, METADATA_COLUMNS};
use crate::repositories::tag_repo::TagRepo;
use crate::repositories::version_repo::{
    is_version_conflict, VersionRepo, MAX_VERSION_INSERT_ATTEMPTS,
};

/// Column list shared across queries to avoid repetition.
pub(crate) const CONTENT_COLUMNS: &str = "id, title, body, content_type, resource_url, \
    hierarchy_id, author_id, is_archived, archived_at, created_at, updated_at";

/// Provides CRUD operations for contents. All mutations append a version.
pub struct ContentRepo;

impl ContentRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a content row by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        let query = format!("SELECT {CONTENT_COLUMNS} FROM contents WHERE id = $1");
        sqlx::query_as::<_, Content>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a content row with its metadata and tag names.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<ContentDetail>, sqlx::Error> {
        let Some(content) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let mut conn = pool.acquire().await?;
        Ok(Some(load_detail_in(&mut conn, content).await?))
    }

    /// List non-archived contents with optional filters, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &ContentListParams,
    ) -> Result<Vec<ContentDetail>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let title_pattern = params.q.as_ref().map(|q| format!("%{q}%"));
        let tag = params
            .tag
            .as_deref()
            .map(coursehub_core::content::normalize_tag_name);

        let query = format!(
            "SELECT {CONTENT_COLUMNS} FROM contents \
             WHERE ($1::TEXT IS NULL OR content_type = $1) \
               AND ($2::TEXT IS NULL OR title ILIKE $2) \
               AND ($3::BOOL = true OR is_archived = false) \
               AND ($4::TEXT IS NULL OR EXISTS ( \
                    SELECT 1 FROM content_tags ct \
                    JOIN tags t ON t.id = ct.tag_id \
                    WHERE ct.content_id = contents.id AND t.name = $4)) \
             ORDER BY created_at DESC \
             LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, Content>(&query)
            .bind(&params.content_type)
            .bind(&title_pattern)
            .bind(params.include_archived)
            .bind(&tag)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let mut conn = pool.acquire().await?;
        let mut details = Vec::with_capacity(rows.len());
        for content in rows {
            details.push(load_detail_in(&mut conn, content).await?);
        }
        Ok(details)
    }

    /// List archived contents, most recently archived first.
    pub async fn list_archived(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ContentDetail>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(offset);

        let query = format!(
            "SELECT {CONTENT_COLUMNS} FROM contents \
             WHERE is_archived = true \
             ORDER BY archived_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, Content>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let mut conn = pool.acquire().await?;
        let mut details = Vec::with_capacity(rows.len());
        for content in rows {
            details.push(load_detail_in(&mut conn, content).await?);
        }
        Ok(details)
    }

    // -----------------------------------------------------------------------
    // Versioned mutations
    // -----------------------------------------------------------------------

    /// Create new content together with version 1.
    ///
    /// Inline metadata and tags are applied before the snapshot is built,
    /// so version 1 captures the complete initial state.
    pub async fn create(
        pool: &PgPool,
        input: &CreateContent,
        author_id: Option<DbId>,
    ) -> Result<ContentDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO contents (title, body, content_type, resource_url, hierarchy_id, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CONTENT_COLUMNS}"
        );
        let content = sqlx::query_as::<_, Content>(&insert_query)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.content_type)
            .bind(&input.resource_url)
            .bind(&input.hierarchy_id)
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;

        let metadata = match &input.metadata {
            Some(fields) => Some(MetadataRepo::upsert_in(&mut tx, content.id, fields).await?),
            None => None,
        };

        if let Some(tags) = &input.tags {
            for name in tags {
                let tag = TagRepo::create_or_get_in(&mut tx, name).await?;
                TagRepo::attach_in(&mut tx, content.id, tag.id).await?;
            }
        }

        let built = VersionRepo::build_snapshot_in(&mut tx, content.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        VersionRepo::insert_in(
            &mut tx,
            content.id,
            1,
            &built,
            Some(NOTE_INITIAL_CREATION),
            author_id,
        )
        .await?;

        let tags = TagRepo::names_for_content_in(&mut tx, content.id).await?;
        tx.commit().await?;

        Ok(ContentDetail {
            content,
            metadata,
            tags,
        })
    }

    /// Apply a partial update and append the next version.
    ///
    /// Only non-`None` fields in `input` are applied; `tags: Some(..)`
    /// replaces the full tag set. Returns `None` if no content row with
    /// the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateContent,
        updated_by: Option<DbId>,
        change_note: &str,
    ) -> Result<Option<ContentDetail>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            let update_query = format!(
                "UPDATE contents SET \
                    title = COALESCE($2, title), \
                    body = COALESCE($3, body), \
                    content_type = COALESCE($4, content_type), \
                    resource_url = COALESCE($5, resource_url), \
                    hierarchy_id = COALESCE($6, hierarchy_id) \
                 WHERE id = $1 \
                 RETURNING {CONTENT_COLUMNS}"
            );
            let Some(content) = sqlx::query_as::<_, Content>(&update_query)
                .bind(id)
                .bind(&input.title)
                .bind(&input.body)
                .bind(&input.content_type)
                .bind(&input.resource_url)
                .bind(&input.hierarchy_id)
                .fetch_optional(&mut *tx)
                .await?
            else {
                return Ok(None);
            };

            if let Some(fields) = &input.metadata {
                MetadataRepo::upsert_in(&mut tx, id, fields).await?;
            }
            if let Some(tags) = &input.tags {
                TagRepo::replace_for_content_in(&mut tx, id, tags).await?;
            }

            let built = VersionRepo::build_snapshot_in(&mut tx, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            let version = VersionRepo::next_version_in(&mut tx, id).await?;

            match VersionRepo::insert_in(&mut tx, id, version, &built, Some(change_note), updated_by)
                .await
            {
                Ok(_) => {
                    let detail = load_detail_in(&mut tx, content).await?;
                    tx.commit().await?;
                    return Ok(Some(detail));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id = id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Archive a content item and append the next version.
    ///
    /// The snapshot never carries archival flags, so the recorded version
    /// captures the item's last live state. Returns `None` if the content
    /// row does not exist.
    pub async fn archive(
        pool: &PgPool,
        id: DbId,
        archived_by: Option<DbId>,
    ) -> Result<Option<Content>, sqlx::Error> {
        Self::set_archived(pool, id, true, NOTE_ARCHIVED, archived_by).await
    }

    /// Bring a content item back from the archive and append the next
    /// version. Returns `None` if the content row does not exist.
    pub async fn unarchive(
        pool: &PgPool,
        id: DbId,
        restored_by: Option<DbId>,
    ) -> Result<Option<Content>, sqlx::Error> {
        Self::set_archived(pool, id, false, NOTE_UNARCHIVED, restored_by).await
    }

    async fn set_archived(
        pool: &PgPool,
        id: DbId,
        archived: bool,
        change_note: &str,
        user_id: Option<DbId>,
    ) -> Result<Option<Content>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            let update_query = format!(
                "UPDATE contents SET \
                    is_archived = $2, \
                    archived_at = CASE WHEN $2 THEN NOW() ELSE NULL END \
                 WHERE id = $1 \
                 RETURNING {CONTENT_COLUMNS}"
            );
            let Some(content) = sqlx::query_as::<_, Content>(&update_query)
                .bind(id)
                .bind(archived)
                .fetch_optional(&mut *tx)
                .await?
            else {
                return Ok(None);
            };

            let built = VersionRepo::build_snapshot_in(&mut tx, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            let version = VersionRepo::next_version_in(&mut tx, id).await?;

            match VersionRepo::insert_in(&mut tx, id, version, &built, Some(change_note), user_id)
                .await
            {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(Some(content));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id = id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Attach tags (by name, creating missing ones) to a content item.
    ///
    /// Idempotent per tag. Appends a version only when at least one new
    /// association was created. Returns `None` if the content row does
    /// not exist.
    pub async fn attach_tags(
        pool: &PgPool,
        id: DbId,
        names: &[String],
        applied_by: Option<DbId>,
    ) -> Result<Option<AttachResult>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            if !content_exists_in(&mut tx, id).await? {
                return Ok(None);
            }

            let mut result = AttachResult::default();
            for name in names {
                let tag = TagRepo::create_or_get_in(&mut tx, name).await?;
                if TagRepo::attach_in(&mut tx, id, tag.id).await? {
                    result.attached.push(tag.name);
                } else {
                    result.skipped.push(tag.name);
                }
            }

            // Nothing changed, nothing to version.
            if result.attached.is_empty() {
                tx.commit().await?;
                return Ok(Some(result));
            }

            let built = VersionRepo::build_snapshot_in(&mut tx, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            let version = VersionRepo::next_version_in(&mut tx, id).await?;
            let note = snapshot::tags_added_note(&result.attached);

            match VersionRepo::insert_in(&mut tx, id, version, &built, Some(&note), applied_by)
                .await
            {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(Some(result));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id = id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Detach a tag (by name) from a content item.
    ///
    /// Appends a version only when an association was actually removed.
    /// Returns `None` if the content row does not exist, otherwise
    /// whether the tag was removed.
    pub async fn detach_tag(
        pool: &PgPool,
        id: DbId,
        name: &str,
        removed_by: Option<DbId>,
    ) -> Result<Option<bool>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut tx = pool.begin().await?;

            if !content_exists_in(&mut tx, id).await? {
                return Ok(None);
            }

            let removed = TagRepo::detach_by_name_in(&mut tx, id, name).await?;
            if !removed {
                tx.commit().await?;
                return Ok(Some(false));
            }

            let built = VersionRepo::build_snapshot_in(&mut tx, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            let version = VersionRepo::next_version_in(&mut tx, id).await?;
            let note = snapshot::tag_removed_note(&coursehub_core::content::normalize_tag_name(name));

            match VersionRepo::insert_in(&mut tx, id, version, &built, Some(&note), removed_by)
                .await
            {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(Some(true));
                }
                Err(err)
                    if is_version_conflict(&err) && attempt < MAX_VERSION_INSERT_ATTEMPTS =>
                {
                    tx.rollback().await?;
                    tracing::warn!(content_id = id, version, attempt, "Version number race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Permanently delete a content item with its versions, tags, and
    /// metadata. Returns `true` if a row was removed.
    ///
    /// This is the only path that removes version rows, and it removes
    /// the whole history with the owning content.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM content_versions WHERE content_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM content_tags WHERE content_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM content_metadata WHERE content_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn content_exists_in(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM contents WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Join a content row with its metadata and tag names.
async fn load_detail_in(
    conn: &mut PgConnection,
    content: Content,
) -> Result<ContentDetail, sqlx::Error> {
    let metadata_query =
        format!("SELECT {METADATA_COLUMNS} FROM content_metadata WHERE content_id = $1");
    let metadata = sqlx::query_as::<_, ContentMetadata>(&metadata_query)
        .bind(content.id)
        .fetch_optional(&mut *conn)
        .await?;
    let tags = TagRepo::names_for_content_in(&mut *conn, content.id).await?;
    Ok(ContentDetail {
        content,
        metadata,
        tags,
    })
}
