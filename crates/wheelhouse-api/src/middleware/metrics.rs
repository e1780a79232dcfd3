//! # Request Metrics
//!
//! Counts requests through the `metrics` facade. The global recorder is
//! installed by the binary; without one every increment is a no-op, which
//! keeps tests and embedded routers free of exporter setup.
//!
//! Requests are labelled by the route template (`/{project_name}`), never
//! the raw path, so project names cannot blow up label cardinality.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Counter incremented once per handled request.
pub const REQUESTS_TOTAL: &str = "wheelhouse_requests_total";

/// Label used for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Middleware that counts every request by route template and status.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED.to_string());

    let response = next.run(request).await;
    record_request(endpoint, response.status().as_u16());
    response
}

/// Record one request against the installed recorder.
pub fn record_request(endpoint: String, status: u16) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}
