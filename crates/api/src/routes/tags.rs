//! Route definitions for global tags, mounted at `/tags`.

use axum::routing::get;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Tag routes, registered as `/tags`.
///
/// ```text
/// GET /            list_tags
/// GET /search      search_tags
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list_tags))
        .route("/search", get(tags::search_tags))
}
