//! Content version entity model and comparison DTOs.

use coursehub_core::diff::SnapshotDiff;
use coursehub_core::snapshot::ContentSnapshot;
use coursehub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_versions` table.
///
/// Rows are immutable once inserted. The snapshot column holds the full
/// restorable state as written by the snapshot builder; it is kept as raw
/// JSON here and decoded on demand via [`ContentVersion::decode_snapshot`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentVersion {
    pub id: DbId,
    pub content_id: DbId,
    pub version: i32,
    pub snapshot: serde_json::Value,
    pub change_note: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

impl ContentVersion {
    /// Decode the stored snapshot blob into its value type.
    ///
    /// Fails only if the stored JSON does not match the snapshot shape,
    /// which would indicate corruption (rows are written exclusively from
    /// serialized [`ContentSnapshot`] values).
    pub fn decode_snapshot(&self) -> Result<ContentSnapshot, serde_json::Error> {
        serde_json::from_value(self.snapshot.clone())
    }
}

/// Version identity carried on both sides of a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct VersionRef {
    pub version: i32,
    pub created_at: Timestamp,
}

/// Response payload for comparing two versions of one content item.
#[derive(Debug, Clone, Serialize)]
pub struct VersionComparison {
    pub version_a: VersionRef,
    pub version_b: VersionRef,
    #[serde(flatten)]
    pub diff: SnapshotDiff,
}
