//! Field-by-field comparison of two content snapshots.
//!
//! The diff is flat: scalar fields are compared individually, the
//! metadata sub-record is compared as one structural unit (any sub-field
//! change reports the whole object), and tags are compared as an
//! unordered set (any membership difference reports both full lists).
//! There is no structural/semantic diffing of the body text.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::snapshot::ContentSnapshot;

/// One changed field: the value in the first snapshot and the second.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// Result of comparing two snapshots.
///
/// `changes` is keyed by field name; `BTreeMap` keeps the output order
/// deterministic for clients and tests.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SnapshotDiff {
    pub changes: BTreeMap<String, FieldChange>,
    pub has_changes: bool,
}

/// Compare two snapshots field by field.
///
/// Symmetric in structure: swapping the arguments only swaps the
/// `from`/`to` labels. Comparing a snapshot against itself yields an
/// empty change map.
pub fn compare_snapshots(a: &ContentSnapshot, b: &ContentSnapshot) -> SnapshotDiff {
    let mut changes = BTreeMap::new();

    compare_field(&mut changes, "title", &a.title, &b.title);
    compare_field(&mut changes, "body", &a.body, &b.body);
    compare_field(&mut changes, "content_type", &a.content_type, &b.content_type);
    compare_field(&mut changes, "resource_url", &a.resource_url, &b.resource_url);
    compare_field(&mut changes, "hierarchy_id", &a.hierarchy_id, &b.hierarchy_id);

    // Metadata is compared as a single unit.
    if a.metadata != b.metadata {
        changes.insert(
            "metadata".to_string(),
            FieldChange {
                from: json!(a.metadata),
                to: json!(b.metadata),
            },
        );
    }

    // Tags are a set: order is irrelevant, but any membership difference
    // reports both full lists in their original order.
    if !same_tag_set(&a.tags, &b.tags) {
        changes.insert(
            "tags".to_string(),
            FieldChange {
                from: json!(a.tags),
                to: json!(b.tags),
            },
        );
    }

    let has_changes = !changes.is_empty();
    SnapshotDiff {
        changes,
        has_changes,
    }
}

fn compare_field<T: PartialEq + serde::Serialize>(
    changes: &mut BTreeMap<String, FieldChange>,
    name: &str,
    a: &T,
    b: &T,
) {
    if a != b {
        changes.insert(
            name.to_string(),
            FieldChange {
                from: json!(a),
                to: json!(b),
            },
        );
    }
}

fn same_tag_set(a: &[String], b: &[String]) -> bool {
    let mut a_sorted: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut b_sorted: Vec<&str> = b.iter().map(String::as_str).collect();
    a_sorted.sort_unstable();
    b_sorted.sort_unstable();
    a_sorted == b_sorted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
