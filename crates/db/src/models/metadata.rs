//! Content metadata sub-record model.

use coursehub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_metadata` table. Zero-or-one per content.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentMetadata {
    pub id: DbId,
    pub content_id: DbId,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<i32>,
    pub prerequisites: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
