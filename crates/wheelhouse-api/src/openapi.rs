//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the index API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wheelhouse: Simple Repository API",
        description = "Read-only package index over a directory of built wheels.\n\nProvides:\n- **Project index** listing every canonical project name\n- **Project pages** with per-file SHA-256 hashes and versions ordered highest first\n- **Downloads** of individual wheels\n\nIndex pages are JSON by default and HTML when the `Accept` header prefers it."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::simple::list_projects,
        crate::routes::simple::list_files,
        crate::routes::simple::get_file,
    ),
    components(
        schemas(
            crate::views::Meta,
            crate::views::IndexView,
            crate::views::ProjectEntry,
            crate::views::PackageView,
            crate::views::FileEntry,
            crate::views::Hashes,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "simple", description = "Simple Repository API: project index, project pages, and downloads"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
