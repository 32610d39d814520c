//! Content validation and type constants.

use crate::error::CoreError;

pub const CONTENT_TYPE_LESSON: &str = "lesson";
pub const CONTENT_TYPE_QUIZ: &str = "quiz";
pub const CONTENT_TYPE_VIDEO: &str = "video";
pub const CONTENT_TYPE_DOCUMENT: &str = "document";
pub const CONTENT_TYPE_LINK: &str = "link";

/// All valid content types.
pub const VALID_CONTENT_TYPES: &[&str] = &[
    CONTENT_TYPE_LESSON,
    CONTENT_TYPE_QUIZ,
    CONTENT_TYPE_VIDEO,
    CONTENT_TYPE_DOCUMENT,
    CONTENT_TYPE_LINK,
];

/// Validate a content title (non-empty, <= 255 chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.len() > 255 {
        return Err(CoreError::Validation(
            "Title must be at most 255 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a content type against the known set.
pub fn validate_content_type(content_type: &str) -> Result<(), CoreError> {
    if !VALID_CONTENT_TYPES.contains(&content_type) {
        return Err(CoreError::Validation(format!(
            "Invalid content type '{}'. Valid types: {}",
            content_type,
            VALID_CONTENT_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// Validate tag names (each non-empty after normalization, <= 50 chars,
/// max 20 tags per request).
pub fn validate_tags(tags: &[String]) -> Result<(), CoreError> {
    if tags.len() > 20 {
        return Err(CoreError::Validation(
            "A maximum of 20 tags is allowed".into(),
        ));
    }
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(CoreError::Validation("Tags must not be empty".into()));
        }
        if tag.len() > 50 {
            return Err(CoreError::Validation(
                "Each tag must be at most 50 characters".into(),
            ));
        }
    }
    Ok(())
}

/// Normalize a tag name: trim whitespace and lowercase.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
