//! Integration tests for content CRUD, tagging, and archival.

use coursehub_core::snapshot::MetadataSnapshot;
use coursehub_db::models::content::{ContentListParams, CreateContent, UpdateContent};
use coursehub_db::repositories::{ContentRepo, TagRepo, VersionRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_content(title: &str, content_type: &str) -> CreateContent {
    CreateContent {
        title: title.to_string(),
        body: None,
        content_type: content_type.to_string(),
        resource_url: None,
        hierarchy_id: None,
        metadata: None,
        tags: None,
    }
}

fn list_params() -> ContentListParams {
    ContentListParams {
        q: None,
        content_type: None,
        tag: None,
        include_archived: false,
        limit: None,
        offset: None,
    }
}

// ---------------------------------------------------------------------------
// Test: create with inline metadata and tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_with_metadata_and_tags(pool: PgPool) {
    let mut input = new_content("Intro to Limits", "lesson");
    input.metadata = Some(MetadataSnapshot {
        subject: Some("math".to_string()),
        topic: None,
        difficulty: None,
        duration: Some(45),
        prerequisites: None,
    });
    input.tags = Some(vec!["Math".to_string(), "  Calculus ".to_string()]);

    let detail = ContentRepo::create(&pool, &input, Some(1)).await.unwrap();

    assert_eq!(detail.content.title, "Intro to Limits");
    assert_eq!(detail.content.author_id, Some(1));
    assert!(!detail.content.is_archived);
    assert_eq!(detail.metadata.as_ref().unwrap().duration, Some(45));
    // Tag names are normalized and listed alphabetically.
    assert_eq!(detail.tags, vec!["calculus".to_string(), "math".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: partial update leaves omitted fields untouched
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_update(pool: PgPool) {
    let mut input = new_content("A", "lesson");
    input.body = Some("original body".to_string());
    let detail = ContentRepo::create(&pool, &input, None).await.unwrap();

    let update = UpdateContent {
        title: Some("B".to_string()),
        body: None,
        content_type: None,
        resource_url: None,
        hierarchy_id: None,
        metadata: None,
        tags: None,
    };
    let updated = ContentRepo::update(&pool, detail.content.id, &update, None, "Content updated")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.content.title, "B");
    assert_eq!(updated.content.body.as_deref(), Some("original body"));
}

// ---------------------------------------------------------------------------
// Test: list filters by type, title search, and tag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters(pool: PgPool) {
    let mut lesson = new_content("Limits of Functions", "lesson");
    lesson.tags = Some(vec!["math".to_string()]);
    ContentRepo::create(&pool, &lesson, None).await.unwrap();
    ContentRepo::create(&pool, &new_content("Weekly Quiz", "quiz"), None)
        .await
        .unwrap();

    let mut by_type = list_params();
    by_type.content_type = Some("quiz".to_string());
    let results = ContentRepo::list(&pool, &by_type).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content.title, "Weekly Quiz");

    let mut by_title = list_params();
    by_title.q = Some("limits".to_string());
    let results = ContentRepo::list(&pool, &by_title).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content.title, "Limits of Functions");

    let mut by_tag = list_params();
    by_tag.tag = Some("math".to_string());
    let results = ContentRepo::list(&pool, &by_tag).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tags, vec!["math".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: archived content is hidden from the default listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archival_listing(pool: PgPool) {
    let detail = ContentRepo::create(&pool, &new_content("A", "lesson"), None)
        .await
        .unwrap();
    let id = detail.content.id;

    let archived = ContentRepo::archive(&pool, id, None).await.unwrap().unwrap();
    assert!(archived.is_archived);
    assert!(archived.archived_at.is_some());

    assert!(ContentRepo::list(&pool, &list_params()).await.unwrap().is_empty());

    let archived_list = ContentRepo::list_archived(&pool, None, None).await.unwrap();
    assert_eq!(archived_list.len(), 1);
    assert_eq!(archived_list[0].content.id, id);

    let live = ContentRepo::unarchive(&pool, id, None).await.unwrap().unwrap();
    assert!(!live.is_archived);
    assert!(live.archived_at.is_none());
    assert_eq!(ContentRepo::list(&pool, &list_params()).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: delete removes the content with its whole history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades(pool: PgPool) {
    let mut input = new_content("A", "lesson");
    input.tags = Some(vec!["x".to_string()]);
    let detail = ContentRepo::create(&pool, &input, None).await.unwrap();
    let id = detail.content.id;

    assert!(ContentRepo::delete(&pool, id).await.unwrap());
    assert!(ContentRepo::find_by_id(&pool, id).await.unwrap().is_none());
    assert!(VersionRepo::list_by_content(&pool, id, 50, 0)
        .await
        .unwrap()
        .is_empty());

    // The tag itself survives; only the association is gone.
    let tags = TagRepo::list_all(&pool).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].content_count, 0);

    // Deleting again is a no-op.
    assert!(!ContentRepo::delete(&pool, id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Test: tag search and listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tag_search(pool: PgPool) {
    let mut input = new_content("A", "lesson");
    input.tags = Some(vec!["calculus".to_string(), "chemistry".to_string()]);
    ContentRepo::create(&pool, &input, None).await.unwrap();

    let found = TagRepo::search(&pool, "cal", 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "calculus");

    let all = TagRepo::list_all(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|t| t.content_count == 1));
}
