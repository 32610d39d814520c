//! Handlers for the version history endpoints: list, get, compare, restore.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use coursehub_core::diff::compare_snapshots;
use coursehub_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use coursehub_core::snapshot::ContentSnapshot;
use coursehub_core::types::DbId;
use coursehub_db::models::content_version::{ContentVersion, VersionComparison, VersionRef};
use coursehub_db::repositories::VersionRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::content::ensure_content;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Query param types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub version_a: i32,
    pub version_b: i32,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// Fetch a version by number or return 404.
async fn ensure_version(
    pool: &sqlx::PgPool,
    content_id: DbId,
    version: i32,
) -> AppResult<ContentVersion> {
    VersionRepo::find_by_content_and_version(pool, content_id, version)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Version {version} not found for content {content_id}"
            ))
        })
}

/// Decode the stored snapshot or report the row as corrupt.
fn decode_snapshot(version: &ContentVersion) -> AppResult<ContentSnapshot> {
    version.decode_snapshot().map_err(|err| {
        AppError::InternalError(format!(
            "Stored snapshot for version {} is not decodable: {err}",
            version.id
        ))
    })
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// GET /content/{id}/versions
///
/// List the version history, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;

    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let versions = VersionRepo::list_by_content(&state.pool, id, limit, offset).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /content/{id}/versions/{version}
///
/// Get one version by its number.
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DbId, i32)>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;
    let found = ensure_version(&state.pool, id, version).await?;
    Ok(Json(DataResponse { data: found }))
}

/// GET /content/{id}/versions/id/{version_id}
///
/// Get one version by its row id. The version must belong to the
/// addressed content.
pub async fn get_version_by_id(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;

    let found = VersionRepo::find_by_id(&state.pool, version_id)
        .await?
        .filter(|v| v.content_id == id)
        .ok_or_else(|| AppError::NotFound(format!("Version {version_id} not found")))?;
    Ok(Json(DataResponse { data: found }))
}

/// GET /content/{id}/versions/compare?version_a=X&version_b=Y
///
/// Compare two versions field by field. Either argument may be the older
/// one; only the from/to labeling depends on argument order.
pub async fn compare_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<CompareParams>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;

    let version_a = ensure_version(&state.pool, id, params.version_a).await?;
    let version_b = ensure_version(&state.pool, id, params.version_b).await?;

    let snapshot_a = decode_snapshot(&version_a)?;
    let snapshot_b = decode_snapshot(&version_b)?;

    let comparison = VersionComparison {
        version_a: VersionRef {
            version: version_a.version,
            created_at: version_a.created_at,
        },
        version_b: VersionRef {
            version: version_b.version,
            created_at: version_b.created_at,
        },
        diff: compare_snapshots(&snapshot_a, &snapshot_b),
    };

    Ok(Json(DataResponse { data: comparison }))
}

/// POST /content/{id}/restore/{version_id}
///
/// Restore a content item to the state captured in the given version.
/// The version is addressed by its own id and must belong to the content.
pub async fn restore_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    ensure_content(&state.pool, id).await?;

    let version = VersionRepo::find_by_id(&state.pool, version_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Version {version_id} not found")))?;

    if version.content_id != id {
        return Err(AppError::BadRequest(
            "Version does not belong to this content".into(),
        ));
    }

    let snapshot = decode_snapshot(&version)?;
    let content = VersionRepo::restore_from_version(
        &state.pool,
        id,
        &snapshot,
        version.version,
        Some(auth.user_id),
    )
    .await?
    .ok_or_else(|| AppError::Core(coursehub_core::error::CoreError::NotFound {
        entity: "Content",
        id,
    }))?;

    tracing::info!(
        user_id = auth.user_id,
        content_id = id,
        restored_from = version.version,
        "Content restored from version"
    );

    Ok(Json(DataResponse { data: content }))
}
