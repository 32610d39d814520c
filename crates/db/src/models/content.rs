//! Content entity model and DTOs.

use coursehub_core::snapshot::MetadataSnapshot;
use coursehub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::metadata::ContentMetadata;

/// A row from the `contents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Content {
    pub id: DbId,
    pub title: String,
    pub body: Option<String>,
    pub content_type: String,
    pub resource_url: Option<String>,
    pub hierarchy_id: Option<String>,
    pub author_id: Option<DbId>,
    pub is_archived: bool,
    pub archived_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A content row joined with its metadata sub-record and tag names.
#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub metadata: Option<ContentMetadata>,
    pub tags: Vec<String>,
}

/// DTO for creating new content. Metadata and tags may be supplied inline.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContent {
    pub title: String,
    pub body: Option<String>,
    pub content_type: String,
    pub resource_url: Option<String>,
    pub hierarchy_id: Option<String>,
    pub metadata: Option<MetadataSnapshot>,
    pub tags: Option<Vec<String>>,
}

/// DTO for updating content. All fields optional; `None` leaves the
/// current value untouched, while `tags: Some(vec![])` clears all tags.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub content_type: Option<String>,
    pub resource_url: Option<String>,
    pub hierarchy_id: Option<String>,
    pub metadata: Option<MetadataSnapshot>,
    pub tags: Option<Vec<String>>,
}

/// Filters for content listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentListParams {
    /// Case-insensitive title substring match.
    pub q: Option<String>,
    pub content_type: Option<String>,
    /// Only content carrying this tag (normalized name).
    pub tag: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
