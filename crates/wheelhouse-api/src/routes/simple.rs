//! # Simple Repository API Routes
//!
//! - `GET /`                            : List every project
//! - `GET /{project_name}`              : List a project's files and versions
//! - `GET /{project_name}/`             : Same, as installers request it
//! - `GET /{project_name}/{file_name}`  : Download one wheel
//!
//! Index operations rescan and rehash the store, so they run on the
//! blocking pool. Downloads stream the open file handle in chunks.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, VARY,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use handlebars::RenderError;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use wheelhouse_core::WHEEL_EXTENSION;
use wheelhouse_store::StoreError;

use crate::error::{AppError, ErrorBody};
use crate::negotiate::ResponseFormat;
use crate::service::{validate_project_name, ServiceError};
use crate::state::AppState;
use crate::views::{IndexView, PackageView};

/// Counter of wheels handed to clients.
pub const FILES_SERVED_TOTAL: &str = "wheelhouse_files_served_total";

/// Wheels are immutable once published under a given filename.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Assemble the Simple Repository API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/{project_name}", get(list_files))
        .route("/{project_name}/", get(list_files))
        .route("/{project_name}/{file_name}", get(get_file))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// An index page with both JSON and HTML representations.
trait IndexPage: Serialize {
    fn to_html(&self) -> Result<String, RenderError>;
}

impl IndexPage for IndexView {
    fn to_html(&self) -> Result<String, RenderError> {
        IndexView::to_html(self)
    }
}

impl IndexPage for PackageView {
    fn to_html(&self) -> Result<String, RenderError> {
        PackageView::to_html(self)
    }
}

fn render(format: ResponseFormat, page: &impl IndexPage) -> Result<Response, AppError> {
    let body = match format {
        ResponseFormat::Json => serde_json::to_vec(page)
            .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?,
        ResponseFormat::Html => page
            .to_html()
            .map_err(|e| AppError::Internal(format!("html rendering failed: {e}")))?
            .into_bytes(),
    };
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, format.content_type()), (VARY, "Accept")],
        body,
    )
        .into_response())
}

/// Run a filesystem-bound service call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await?
        .map_err(AppError::from)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// List every project that has at least one artifact.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Project list, sorted by canonical name. HTML when the Accept header prefers it.",
         body = IndexView, content_type = "application/vnd.pypi.simple.v1+json"),
        (status = 500, description = "Store unreadable or invalid artifact", body = ErrorBody),
    ),
    tag = "simple"
)]
pub(crate) async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let format = ResponseFormat::from_headers(&headers);
    let service = state.service.clone();
    let view = blocking(move || service.list_projects()).await?;
    render(format, &view)
}

/// List one project's files with hashes, and its distinct versions.
#[utoipa::path(
    get,
    path = "/{project_name}",
    params(
        ("project_name" = String, Path, description = "Project name in any spelling; matched after canonicalization")
    ),
    responses(
        (status = 200, description = "Project files and versions, empty when nothing matches. HTML when the Accept header prefers it.",
         body = PackageView, content_type = "application/vnd.pypi.simple.v1+json"),
        (status = 400, description = "Project name outside [A-Za-z0-9_-]+", body = ErrorBody),
        (status = 500, description = "Store unreadable or invalid artifact", body = ErrorBody),
    ),
    tag = "simple"
)]
pub(crate) async fn list_files(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    validate_project_name(&project_name)?;
    let format = ResponseFormat::from_headers(&headers);
    let service = state.service.clone();
    let view = blocking(move || service.list_files(&project_name)).await?;
    render(format, &view)
}

/// Download one wheel.
#[utoipa::path(
    get,
    path = "/{project_name}/{file_name}",
    params(
        ("project_name" = String, Path, description = "Project name in any spelling"),
        ("file_name" = String, Path, description = "Wheel filename including the .whl extension")
    ),
    responses(
        (status = 200, description = "Wheel bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Project name outside [A-Za-z0-9_-]+", body = ErrorBody),
        (status = 404, description = "No unique artifact matched", body = ErrorBody),
        (status = 500, description = "Store unreadable or invalid artifact", body = ErrorBody),
    ),
    tag = "simple"
)]
pub(crate) async fn get_file(
    State(state): State<AppState>,
    Path((project_name, file_name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    validate_project_name(&project_name)?;
    let Some(wheel_name) = file_name.strip_suffix(WHEEL_EXTENSION) else {
        return Err(AppError::NotFound(format!("{file_name} is not a wheel")));
    };
    let wheel_name = wheel_name.to_string();

    let service = state.service.clone();
    let (filename, file, len) = blocking(move || {
        let artifact = service.get_file(&project_name, &wheel_name)?;
        let file = service.store().open(&artifact)?;
        let len = file
            .metadata()
            .map_err(|e| StoreError::Io {
                path: artifact.path().to_path_buf(),
                source: e,
            })?
            .len();
        Ok((artifact.filename().to_string(), file, len))
    })
    .await?;

    tracing::debug!(filename = %filename, bytes = len, "serving artifact");
    metrics::counter!(FILES_SERVED_TOTAL).increment(1);

    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_LENGTH, len)
        .header(CACHE_CONTROL, IMMUTABLE_CACHE)
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("failed to build download response: {e}")))
}
