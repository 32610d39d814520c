//! Handlers for the global tag endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use coursehub_db::models::tag::Tag;
use coursehub_db::repositories::TagRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default number of search results.
const DEFAULT_SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// GET /tags
///
/// List all tags with the number of contents carrying each.
pub async fn list_tags(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let tags = TagRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// GET /tags/search?q=prefix&limit=N
///
/// Prefix-search tags by name.
pub async fn search_tags(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let q = params.q.unwrap_or_default();
    if q.trim().is_empty() {
        return Ok(Json(DataResponse {
            data: Vec::<Tag>::new(),
        }));
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let tags = TagRepo::search(&state.pool, &q, limit).await?;
    Ok(Json(DataResponse { data: tags }))
}
