//! Route definitions for content, mounted at `/content`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{content, versions};
use crate::state::AppState;

/// Content routes, registered as `/content`.
///
/// ```text
/// GET    /                                   list_content
/// POST   /                                   create_content
/// GET    /archived                           list_archived
/// GET    /{id}                               get_content
/// PUT    /{id}                               update_content
/// DELETE /{id}                               delete_content
/// POST   /{id}/archive                       archive_content
/// POST   /{id}/unarchive                     unarchive_content
/// GET    /{id}/tags                          get_content_tags
/// POST   /{id}/tags                          attach_tags
/// DELETE /{id}/tags/{name}                   detach_tag
/// GET    /{id}/versions                      list_versions
/// GET    /{id}/versions/compare              compare_versions
/// GET    /{id}/versions/id/{version_id}      get_version_by_id
/// GET    /{id}/versions/{version}            get_version
/// POST   /{id}/restore/{version_id}          restore_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_content).post(content::create_content))
        .route("/archived", get(content::list_archived))
        .route(
            "/{id}",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
        .route("/{id}/archive", post(content::archive_content))
        .route("/{id}/unarchive", post(content::unarchive_content))
        .route(
            "/{id}/tags",
            get(content::get_content_tags).post(content::attach_tags),
        )
        .route("/{id}/tags/{name}", delete(content::detach_tag))
        .route("/{id}/versions", get(versions::list_versions))
        .route("/{id}/versions/compare", get(versions::compare_versions))
        .route("/{id}/versions/id/{version_id}", get(versions::get_version_by_id))
        .route("/{id}/versions/{version}", get(versions::get_version))
        .route("/{id}/restore/{version_id}", post(versions::restore_version))
}
