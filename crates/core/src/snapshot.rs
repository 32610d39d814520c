//! Snapshot value types and change-note builders.
//!
//! A [`ContentSnapshot`] captures everything restorable about a content
//! item at one point in time. Snapshots are immutable once built and are
//! persisted verbatim (as JSONB) on every version row, so the stored
//! history is self-contained: restoring never has to consult anything but
//! the snapshot itself.
//!
//! Archival state is deliberately NOT part of the snapshot. Restoring
//! always brings content back to a live state (see the restore engine in
//! the db crate).

use serde::{Deserialize, Serialize};

/// Restorable state of a content item.
///
/// Equality is structural. Note that `tags` is an ordered `Vec` for
/// serialization stability, but tag comparison in the diff engine is
/// order-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub title: String,
    pub body: Option<String>,
    pub content_type: String,
    pub resource_url: Option<String>,
    pub hierarchy_id: Option<String>,
    pub metadata: Option<MetadataSnapshot>,
    pub tags: Vec<String>,
}

/// The metadata sub-record as captured in a snapshot.
///
/// `None` at the [`ContentSnapshot::metadata`] level means "no metadata
/// was captured", not "metadata is absent" -- restore leaves existing
/// metadata untouched in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<i32>,
    pub prerequisites: Option<String>,
}

// ---------------------------------------------------------------------------
// Change notes
// ---------------------------------------------------------------------------

/// Change note for version 1, written at content creation.
pub const NOTE_INITIAL_CREATION: &str = "Initial creation";

/// Fallback change note for an update that did not rename the content.
pub const NOTE_CONTENT_UPDATED: &str = "Content updated";

/// Change note written when content is archived.
pub const NOTE_ARCHIVED: &str = "Archived";

/// Change note written when content is brought back from the archive.
pub const NOTE_UNARCHIVED: &str = "Restored from archive";

/// Change note for a content update. Calls out a title change explicitly
/// since that is the rename users care about in the history view.
pub fn update_change_note(old_title: &str, new_title: Option<&str>) -> String {
    match new_title {
        Some(new) if new != old_title => {
            format!("Title changed: \"{old_title}\" → \"{new}\"")
        }
        _ => NOTE_CONTENT_UPDATED.to_string(),
    }
}

/// Change note for a version created by restoring from an older version.
pub fn restore_change_note(source_version: i32) -> String {
    format!("Restored from version {source_version}")
}

/// Change note for a tag-attach operation.
pub fn tags_added_note(tags: &[String]) -> String {
    format!("Tags added: {}", tags.join(", "))
}

/// Change note for a tag-detach operation.
pub fn tag_removed_note(tag: &str) -> String {
    format!("Tag removed: {tag}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ContentSnapshot {
        ContentSnapshot {
            title: "Intro to Limits".to_string(),
            body: Some("lesson body".to_string()),
            content_type: "lesson".to_string(),
            resource_url: None,
            hierarchy_id: Some("calc-101".to_string()),
            metadata: Some(MetadataSnapshot {
                subject: Some("math".to_string()),
                topic: Some("limits".to_string()),
                difficulty: Some("beginner".to_string()),
                duration: Some(45),
                prerequisites: None,
            }),
            tags: vec!["math".to_string(), "calculus".to_string()],
        }
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let original = snapshot();
        let value = serde_json::to_value(&original).unwrap();
        let back: ContentSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn snapshot_equality_is_structural() {
        assert_eq!(snapshot(), snapshot());
        let mut other = snapshot();
        other.metadata.as_mut().unwrap().duration = Some(60);
        assert_ne!(snapshot(), other);
    }

    #[test]
    fn update_note_mentions_title_change() {
        let note = update_change_note("Old", Some("New"));
        assert!(note.contains("\"Old\""));
        assert!(note.contains("\"New\""));
    }

    #[test]
    fn update_note_falls_back_when_title_unchanged() {
        assert_eq!(update_change_note("Same", Some("Same")), NOTE_CONTENT_UPDATED);
        assert_eq!(update_change_note("Same", None), NOTE_CONTENT_UPDATED);
    }

    #[test]
    fn restore_note_names_source_version() {
        assert_eq!(restore_change_note(3), "Restored from version 3");
    }

    #[test]
    fn tag_notes_list_names() {
        let tags = vec!["rust".to_string(), "async".to_string()];
        assert_eq!(tags_added_note(&tags), "Tags added: rust, async");
        assert_eq!(tag_removed_note("rust"), "Tag removed: rust");
    }
}
