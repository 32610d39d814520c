//! Repository for the `tags` and `content_tags` tables.
//!
//! Tag names are normalized (trimmed, lowercased) before any lookup or
//! insert so `uq_tags_name` holds over the normalized form.

use coursehub_core::content::normalize_tag_name;
use coursehub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tag::{Tag, TagWithCount};

/// Column list for `tags` queries.
const COLUMNS: &str = "id, name, created_at";

/// Maximum number of prefix-search results.
const MAX_SEARCH_LIMIT: i64 = 50;

/// Provides tag CRUD and content-tag association operations.
pub struct TagRepo;

impl TagRepo {
    // -----------------------------------------------------------------------
    // Transaction-participating primitives
    // -----------------------------------------------------------------------

    /// Get or create a tag by name (normalized). Idempotent.
    pub async fn create_or_get_in(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Tag, sqlx::Error> {
        let normalized = normalize_tag_name(name);
        let query = format!(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(&normalized)
            .fetch_one(conn)
            .await
    }

    /// Associate a tag with a content item. Returns `true` if a new
    /// association was created, `false` if it already existed.
    pub async fn attach_in(
        conn: &mut PgConnection,
        content_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO content_tags (content_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (content_id, tag_id) DO NOTHING",
        )
        .bind(content_id)
        .bind(tag_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a tag association by tag name. Returns `true` if an
    /// association was actually removed.
    pub async fn detach_by_name_in(
        conn: &mut PgConnection,
        content_id: DbId,
        name: &str,
    ) -> Result<bool, sqlx::Error> {
        let normalized = normalize_tag_name(name);
        let result = sqlx::query(
            "DELETE FROM content_tags ct \
             USING tags t \
             WHERE ct.tag_id = t.id AND ct.content_id = $1 AND t.name = $2",
        )
        .bind(content_id)
        .bind(&normalized)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace all tag associations for a content item with the given
    /// names, creating missing tags on the way.
    pub async fn replace_for_content_in(
        conn: &mut PgConnection,
        content_id: DbId,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM content_tags WHERE content_id = $1")
            .bind(content_id)
            .execute(&mut *conn)
            .await?;

        for name in names {
            let tag = Self::create_or_get_in(&mut *conn, name).await?;
            Self::attach_in(&mut *conn, content_id, tag.id).await?;
        }
        Ok(())
    }

    /// List the tag names attached to a content item, alphabetically.
    pub async fn names_for_content_in(
        conn: &mut PgConnection,
        content_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT t.name FROM content_tags ct \
             JOIN tags t ON t.id = ct.tag_id \
             WHERE ct.content_id = $1 \
             ORDER BY t.name",
        )
        .bind(content_id)
        .fetch_all(conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Pool-facing reads
    // -----------------------------------------------------------------------

    /// List the tag names attached to a content item.
    pub async fn names_for_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::names_for_content_in(&mut conn, content_id).await
    }

    /// List all tags with the number of contents carrying each.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TagWithCount>, sqlx::Error> {
        sqlx::query_as::<_, TagWithCount>(
            "SELECT t.id, t.name, COUNT(ct.id) AS content_count \
             FROM tags t \
             LEFT JOIN content_tags ct ON ct.tag_id = t.id \
             GROUP BY t.id, t.name \
             ORDER BY t.name",
        )
        .fetch_all(pool)
        .await
    }

    /// Prefix-search tags by normalized name.
    pub async fn search(
        pool: &PgPool,
        prefix: &str,
        limit: i64,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let pattern = format!("{}%", normalize_tag_name(prefix));
        let query = format!(
            "SELECT {COLUMNS} FROM tags \
             WHERE name LIKE $1 \
             ORDER BY name \
             LIMIT $2"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(&pattern)
            .bind(limit.min(MAX_SEARCH_LIMIT))
            .fetch_all(pool)
            .await
    }
}
