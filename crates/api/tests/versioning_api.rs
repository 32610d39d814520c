//! HTTP-level integration tests for the version history endpoints.

mod common;

use axum::http::StatusCode;
use common::{auth_token, body_json, build_test_app, get, post, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

/// Create a content item via the API and return its id.
async fn create_content(app: &axum::Router, token: &str, title: &str) -> i64 {
    let response = post_json(
        app,
        "/api/v1/content",
        Some(token),
        json!({ "title": title, "content_type": "lesson" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Look up the row id of a given version number via the list endpoint.
async fn version_row_id(app: &axum::Router, content_id: i64, version: i64) -> i64 {
    let response = get(app, &format!("/api/v1/content/{content_id}/versions")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["version"].as_i64() == Some(version))
        .unwrap()["id"]
        .as_i64()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: create then update produces a field-level diff
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_update_compare(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;

    let response = put_json(
        &app,
        &format!("/api/v1/content/{id}"),
        Some(&token),
        json!({ "title": "B", "tags": ["x"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(
        &app,
        &format!("/api/v1/content/{id}/versions/compare?version_a=1&version_b=2"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["has_changes"], json!(true));
    assert_eq!(data["version_a"]["version"], json!(1));
    assert_eq!(data["version_b"]["version"], json!(2));
    assert_eq!(data["changes"]["title"]["from"], json!("A"));
    assert_eq!(data["changes"]["title"]["to"], json!("B"));
    assert_eq!(data["changes"]["tags"]["from"], json!([]));
    assert_eq!(data["changes"]["tags"]["to"], json!(["x"]));
}

// ---------------------------------------------------------------------------
// Test: comparing a version against itself reports no changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_compare_same_version(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;

    let response = get(
        &app,
        &format!("/api/v1/content/{id}/versions/compare?version_a=1&version_b=1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["has_changes"], json!(false));
    assert_eq!(json["data"]["changes"], json!({}));
}

// ---------------------------------------------------------------------------
// Test: restore rewrites content and appends a documenting version
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_creates_new_version(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;

    put_json(
        &app,
        &format!("/api/v1/content/{id}"),
        Some(&token),
        json!({ "title": "B", "tags": ["x"] }),
    )
    .await;

    let v1_id = version_row_id(&app, id, 1).await;

    // The version is also addressable by its row id.
    let response = get(&app, &format!("/api/v1/content/{id}/versions/id/{v1_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["version"], json!(1));

    let response = post(
        &app,
        &format!("/api/v1/content/{id}/restore/{v1_id}"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], json!("A"));
    assert_eq!(json["data"]["is_archived"], json!(false));

    // The restore appended version 3.
    let response = get(&app, &format!("/api/v1/content/{id}/versions")).await;
    let json = body_json(response).await;
    let versions = json["data"].as_array().unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(versions[0]["version"], json!(3));
    assert!(versions[0]["change_note"]
        .as_str()
        .unwrap()
        .contains("Restored from version 1"));
    assert_eq!(versions[0]["created_by"], json!(1));

    // Tags were reset to the restored snapshot's (empty) set.
    let response = get(&app, &format!("/api/v1/content/{id}/tags")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"], json!([]));
}

// ---------------------------------------------------------------------------
// Test: a version from another content item cannot be restored
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cross_content_restore_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let first = create_content(&app, &token, "First").await;
    let second = create_content(&app, &token, "Second").await;

    let foreign_version = version_row_id(&app, second, 1).await;
    let response = post(
        &app,
        &format!("/api/v1/content/{first}/restore/{foreign_version}"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("does not belong"));

    // No state change on the target content.
    let response = get(&app, &format!("/api/v1/content/{first}")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], json!("First"));

    let response = get(&app, &format!("/api/v1/content/{first}/versions")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: missing versions yield 404
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_version_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;

    let response = get(&app, &format!("/api/v1/content/{id}/versions/99")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, &format!("/api/v1/content/{id}/versions/id/999999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post(
        &app,
        &format!("/api/v1/content/{id}/restore/999999"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(
        &app,
        &format!("/api/v1/content/{id}/versions/compare?version_a=1&version_b=9"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: restore requires authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_requires_auth(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;
    let v1_id = version_row_id(&app, id, 1).await;

    let response = post(&app, &format!("/api/v1/content/{id}/restore/{v1_id}"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Test: version listing is newest-first
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versions_listed_newest_first(pool: PgPool) {
    let app = build_test_app(pool);
    let token = auth_token(1);
    let id = create_content(&app, &token, "A").await;

    for title in ["B", "C"] {
        put_json(
            &app,
            &format!("/api/v1/content/{id}"),
            Some(&token),
            json!({ "title": title }),
        )
        .await;
    }

    let response = get(&app, &format!("/api/v1/content/{id}/versions")).await;
    let json = body_json(response).await;
    let numbers: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);
}
