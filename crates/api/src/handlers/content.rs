//! Handlers for content CRUD, archival, and tagging.
//!
//! Every mutation goes through the versioned repository operations, so
//! each successful request leaves exactly one new row in the version log.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use coursehub_core::content::{validate_content_type, validate_tags, validate_title};
use coursehub_core::error::CoreError;
use coursehub_core::snapshot::update_change_note;
use coursehub_core::types::DbId;
use coursehub_db::models::content::{Content, ContentListParams, CreateContent, UpdateContent};
use coursehub_db::repositories::{ContentRepo, TagRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct AttachTagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DetachResponse {
    removed: bool,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// Fetch a content row or return 404.
pub(crate) async fn ensure_content(pool: &sqlx::PgPool, id: DbId) -> AppResult<Content> {
    ContentRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))
}

/* --------------------------------------------------------------------------
CRUD
-------------------------------------------------------------------------- */

/// GET /content
///
/// List non-archived content with optional filters.
pub async fn list_content(
    State(state): State<AppState>,
    Query(params): Query<ContentListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref content_type) = params.content_type {
        validate_content_type(content_type).map_err(AppError::Core)?;
    }
    let contents = ContentRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: contents }))
}

/// GET /content/archived
///
/// List archived content, most recently archived first.
pub async fn list_archived(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let contents = ContentRepo::list_archived(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: contents }))
}

/// POST /content
///
/// Create new content; version 1 is written in the same transaction.
pub async fn create_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateContent>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title).map_err(AppError::Core)?;
    validate_content_type(&input.content_type).map_err(AppError::Core)?;
    if let Some(ref tags) = input.tags {
        validate_tags(tags).map_err(AppError::Core)?;
    }

    let detail = ContentRepo::create(&state.pool, &input, Some(auth.user_id)).await?;

    tracing::info!(
        user_id = auth.user_id,
        content_id = detail.content.id,
        "Content created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /content/{id}
///
/// Fetch one content item with metadata and tags.
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = ContentRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /content/{id}
///
/// Apply a partial update; the next version is written in the same
/// transaction.
pub async fn update_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateContent>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_content(&state.pool, id).await?;

    if let Some(ref title) = input.title {
        validate_title(title).map_err(AppError::Core)?;
    }
    if let Some(ref content_type) = input.content_type {
        validate_content_type(content_type).map_err(AppError::Core)?;
    }
    if let Some(ref tags) = input.tags {
        validate_tags(tags).map_err(AppError::Core)?;
    }

    let change_note = update_change_note(&existing.title, input.title.as_deref());
    let detail = ContentRepo::update(&state.pool, id, &input, Some(auth.user_id), &change_note)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;

    tracing::info!(user_id = auth.user_id, content_id = id, "Content updated");

    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /content/{id}
///
/// Permanently delete a content item and its whole version history.
pub async fn delete_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;
    ContentRepo::delete(&state.pool, id).await?;

    tracing::info!(user_id = auth.user_id, content_id = id, "Content deleted");

    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
Archival
-------------------------------------------------------------------------- */

/// POST /content/{id}/archive
pub async fn archive_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_content(&state.pool, id).await?;
    if existing.is_archived {
        return Err(AppError::Core(CoreError::Validation(
            "Content is already archived".into(),
        )));
    }

    let content = ContentRepo::archive(&state.pool, id, Some(auth.user_id))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;

    tracing::info!(user_id = auth.user_id, content_id = id, "Content archived");

    Ok(Json(DataResponse { data: content }))
}

/// POST /content/{id}/unarchive
pub async fn unarchive_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_content(&state.pool, id).await?;
    if !existing.is_archived {
        return Err(AppError::Core(CoreError::Validation(
            "Content is not archived".into(),
        )));
    }

    let content = ContentRepo::unarchive(&state.pool, id, Some(auth.user_id))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;

    tracing::info!(user_id = auth.user_id, content_id = id, "Content unarchived");

    Ok(Json(DataResponse { data: content }))
}

/* --------------------------------------------------------------------------
Tagging
-------------------------------------------------------------------------- */

/// GET /content/{id}/tags
pub async fn get_content_tags(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;
    let tags = TagRepo::names_for_content(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /content/{id}/tags
///
/// Attach tags by name, creating missing ones. Idempotent per tag.
pub async fn attach_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AttachTagsRequest>,
) -> AppResult<impl IntoResponse> {
    validate_tags(&input.tags).map_err(AppError::Core)?;
    ensure_content(&state.pool, id).await?;

    let result = ContentRepo::attach_tags(&state.pool, id, &input.tags, Some(auth.user_id))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;

    tracing::info!(
        user_id = auth.user_id,
        content_id = id,
        attached = result.attached.len(),
        "Tags attached"
    );

    Ok(Json(DataResponse { data: result }))
}

/// DELETE /content/{id}/tags/{name}
pub async fn detach_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, name)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;

    let removed = ContentRepo::detach_tag(&state.pool, id, &name, Some(auth.user_id))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;

    tracing::info!(
        user_id = auth.user_id,
        content_id = id,
        tag = %name,
        removed,
        "Tag detach requested"
    );

    Ok(Json(DataResponse {
        data: DetachResponse { removed },
    }))
}
