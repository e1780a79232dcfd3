//! # wheelhouse-api: Simple Repository API over a Wheel Directory
//!
//! Serves a read-only package index that installers can point at with
//! `--index-url`. Artifacts come from an [`wheelhouse_store::ArtifactStore`]
//! laid out as `{root}/{family}/dist/*.whl`; nothing is cached between
//! requests.
//!
//! ## API Surface
//!
//! | Path                            | Module                | Purpose              |
//! |---------------------------------|-----------------------|----------------------|
//! | `/`                             | [`routes::simple`]    | Project index        |
//! | `/{project_name}[/]`            | [`routes::simple`]    | Project page         |
//! | `/{project_name}/{file_name}`   | [`routes::simple`]    | Wheel download       |
//! | `/health/liveness`              | crate root            | Liveness check       |
//! | `/health/readiness`             | crate root            | Readiness check      |
//! | `/_/metrics`                    | crate root            | Prometheus scrape    |
//! | `/openapi.json`                 | [`openapi`]           | OpenAPI 3.1 spec     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! The metrics middleware is only registered when metrics are enabled.

pub mod error;
pub mod middleware;
pub mod negotiate;
pub mod openapi;
pub mod routes;
pub mod service;
pub mod state;
pub mod views;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::simple::router())
        .merge(openapi::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if state.metrics.is_some() {
        router = router.route("/_/metrics", get(prometheus_metrics));
    }

    if state.config.metrics_enabled {
        router = router.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET /_/metrics: Prometheus metrics scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 when the artifact root can be listed, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.service.clone();
    let available = tokio::task::spawn_blocking(move || service.store().is_available())
        .await
        .unwrap_or(false);

    if available {
        (StatusCode::OK, "ready").into_response()
    } else {
        tracing::warn!(
            root = %state.config.artifact_root.display(),
            "artifact root unavailable"
        );
        (StatusCode::SERVICE_UNAVAILABLE, "artifact root unavailable").into_response()
    }
}
