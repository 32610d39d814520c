//! Route definitions, grouped by resource.

pub mod content;
pub mod health;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /content/...   content CRUD, archival, tagging, version history
/// /tags/...      global tag listing and search
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/content", content::router())
        .nest("/tags", tags::router())
}
