//! Tag models.

use coursehub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A tag with the number of contents currently carrying it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithCount {
    pub id: DbId,
    pub name: String,
    pub content_count: i64,
}

/// Result of a tag-attach operation: which names were newly attached and
/// which were already present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttachResult {
    pub attached: Vec<String>,
    pub skipped: Vec<String>,
}
