//! # Integration Tests for wheelhouse-api
//!
//! Drives the assembled router against temporary artifact trees: project
//! listing, project pages, downloads, validation, scan policy, content
//! negotiation, health checks, metrics, and the OpenAPI document.

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tower::ServiceExt;

use wheelhouse_api::service::ScanPolicy;
use wheelhouse_api::state::{AppConfig, AppState};

/// A temporary artifact root. Dropping it removes the tree.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `{root}/{family}/dist/{filename}`.
    fn wheel(&self, family: &str, filename: &str, bytes: &[u8]) -> &Self {
        let dist = self.root().join(family).join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join(filename), bytes).unwrap();
        self
    }

    fn config(&self, policy: ScanPolicy) -> AppConfig {
        AppConfig {
            artifact_root: self.root().to_path_buf(),
            scan_policy: policy,
            ..AppConfig::default()
        }
    }

    fn app(&self) -> axum::Router {
        wheelhouse_api::app(AppState::new(self.config(ScanPolicy::Strict)))
    }

    fn lenient_app(&self) -> axum::Router {
        wheelhouse_api::app(AppState::new(self.config(ScanPolicy::Lenient)))
    }
}

/// The sample tree used by most tests.
fn sample() -> Fixture {
    let fx = Fixture::new();
    fx.wheel("dep-plain", "dep_plain-0.1.0-py3-none-any.whl", b"plain 0.1.0")
        .wheel("dep-plain", "dep_plain-0.2.0-py3-none-any.whl", b"plain 0.2.0")
        .wheel("dep-plain", "dep_plain-0.10.0-py3-none-any.whl", b"plain 0.10.0")
        .wheel("dep-old", "dep_old-1.0.0-py3-none-any.whl", b"old 1.0.0")
        .wheel("dep-urllib3", "dep_urllib3-2.3.0-py3-none-any.whl", b"urllib3 2.3.0")
        .wheel("dep-urllib3", "dep_urllib3-1.26.20-py3-none-any.whl", b"urllib3 1.26.20");
    fx
}

async fn get(app: axum::Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_with_accept(app: axum::Router, uri: &str, accept: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header(header::ACCEPT, accept)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// -- Project index ------------------------------------------------------------

#[tokio::test]
async fn test_list_projects_sorted_and_deduplicated() {
    let fx = sample();
    fx.wheel("Dep.Plain", "Dep.Plain-0.3.0-py3-none-any.whl", b"dotted");

    let response = get(fx.app(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/vnd.pypi.simple.v1+json"
    );
    let body = body_json(response).await;
    assert_eq!(body["meta"]["api-version"], "1.1");
    let names: Vec<&str> = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["dep-old", "dep-plain", "dep-urllib3"]);
}

#[tokio::test]
async fn test_list_projects_empty_store() {
    let fx = Fixture::new();
    let body = body_json(get(fx.app(), "/").await).await;
    assert_eq!(body["projects"], serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_root_is_empty_index() {
    let fx = Fixture::new();
    let config = AppConfig {
        artifact_root: fx.root().join("does-not-exist"),
        ..AppConfig::default()
    };
    let app = wheelhouse_api::app(AppState::new(config));
    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["projects"], serde_json::json!([]));
}

// -- Project pages ------------------------------------------------------------

#[tokio::test]
async fn test_list_files_versions_descending() {
    let fx = sample();
    let response = get(fx.app(), "/dep-plain").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "dep-plain");
    assert_eq!(
        body["versions"],
        serde_json::json!(["0.10.0", "0.2.0", "0.1.0"])
    );
    assert_eq!(body["files"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_files_entry_shape() {
    let fx = sample();
    let body = body_json(get(fx.app(), "/dep-old").await).await;
    let file = &body["files"][0];
    assert_eq!(file["filename"], "dep_old-1.0.0-py3-none-any.whl");
    assert_eq!(file["url"], "/dep-old/dep_old-1.0.0-py3-none-any.whl");
    assert_eq!(file["hashes"]["sha256"], sha256_hex(b"old 1.0.0"));
    assert_eq!(file["size"], 9);
    assert_eq!(file["requires-python"], serde_json::Value::Null);
    assert_eq!(file["upload-time"], serde_json::Value::Null);
    assert_eq!(file["core-metadata"], false);
    assert_eq!(file["yanked"], false);
}

#[tokio::test]
async fn test_list_files_name_spellings_are_equivalent() {
    let fx = sample();
    let canonical = body_json(get(fx.app(), "/dep-plain").await).await;
    for spelling in ["/Dep-Plain", "/dep_plain", "/DEP_PLAIN"] {
        let body = body_json(get(fx.app(), spelling).await).await;
        assert_eq!(body["name"], canonical["name"], "{spelling}");
        assert_eq!(body["versions"], canonical["versions"], "{spelling}");
        let hashes = |v: &serde_json::Value| -> Vec<String> {
            v["files"]
                .as_array()
                .unwrap()
                .iter()
                .map(|f| f["hashes"]["sha256"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(hashes(&body), hashes(&canonical), "{spelling}");
    }
}

#[tokio::test]
async fn test_list_files_url_reuses_request_segment() {
    let fx = sample();
    let body = body_json(get(fx.app(), "/dep_old").await).await;
    assert_eq!(body["name"], "dep-old");
    assert_eq!(body["files"][0]["url"], "/dep_old/dep_old-1.0.0-py3-none-any.whl");
}

#[tokio::test]
async fn test_list_files_unknown_project_is_empty_200() {
    let fx = sample();
    let response = get(fx.app(), "/nothing-here").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["files"], serde_json::json!([]));
    assert_eq!(body["versions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_files_trailing_slash() {
    let fx = sample();
    let plain = body_json(get(fx.app(), "/dep-old").await).await;
    let slashed = body_json(get(fx.app(), "/dep-old/").await).await;
    assert_eq!(plain, slashed);
}

#[tokio::test]
async fn test_list_files_hash_stable_across_requests() {
    let fx = sample();
    let first = body_json(get(fx.app(), "/dep-urllib3").await).await;
    let second = body_json(get(fx.app(), "/dep-urllib3").await).await;
    assert_eq!(first["files"], second["files"]);
}

#[tokio::test]
async fn test_list_files_reflects_changes_without_restart() {
    let fx = sample();
    let app = fx.app();
    let before = body_json(get(app.clone(), "/dep-old").await).await;
    fx.wheel("dep-old", "dep_old-1.1.0-py3-none-any.whl", b"old 1.1.0");
    let after = body_json(get(app, "/dep-old").await).await;
    assert_eq!(before["versions"], serde_json::json!(["1.0.0"]));
    assert_eq!(after["versions"], serde_json::json!(["1.1.0", "1.0.0"]));
}

#[tokio::test]
async fn test_list_files_invalid_name_is_400() {
    let fx = sample();
    for uri in ["/dep%2Fplain", "/dep.plain", "/dep%20plain"] {
        let response = get(fx.app(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

// -- Downloads ----------------------------------------------------------------

#[tokio::test]
async fn test_get_file_returns_bytes_and_headers() {
    let fx = sample();
    let response = get(fx.app(), "/dep-plain/dep_plain-0.2.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/octet-stream"
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "11");
    assert!(header_str(&response, header::CACHE_CONTROL).contains("immutable"));
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"dep_plain-0.2.0-py3-none-any.whl\""
    );
    assert_eq!(body_bytes(response).await, b"plain 0.2.0");
}

#[tokio::test]
async fn test_get_file_hash_matches_listing() {
    let fx = sample();
    let listing = body_json(get(fx.app(), "/dep-urllib3").await).await;
    for file in listing["files"].as_array().unwrap() {
        let url = file["url"].as_str().unwrap();
        let bytes = body_bytes(get(fx.app(), url).await).await;
        assert_eq!(sha256_hex(&bytes), file["hashes"]["sha256"].as_str().unwrap());
        assert_eq!(bytes.len() as u64, file["size"].as_u64().unwrap());
    }
}

#[tokio::test]
async fn test_get_file_any_project_spelling() {
    let fx = sample();
    let response = get(fx.app(), "/Dep_Plain/dep_plain-0.1.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"plain 0.1.0");
}

#[tokio::test]
async fn test_get_file_empty_store_is_404() {
    let fx = Fixture::new();
    let response = get(fx.app(), "/dep-plain/dep_plain-1.0.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_file_wrong_project_is_404() {
    let fx = sample();
    let response = get(fx.app(), "/dep-old/dep_plain-0.1.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_file_without_wheel_extension_is_404() {
    let fx = sample();
    let response = get(fx.app(), "/dep-old/dep_old-1.0.0-py3-none-any").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_file_invalid_project_is_400() {
    let fx = sample();
    let response = get(fx.app(), "/dep%2Fplain/dep_plain-0.1.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_file_ambiguous_is_404() {
    let fx = sample();
    fx.wheel("dep-plain-mirror", "dep_plain-0.1.0-py3-none-any.whl", b"copy");
    let response = get(fx.app(), "/dep-plain/dep_plain-0.1.0-py3-none-any.whl").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Scan policy --------------------------------------------------------------

#[tokio::test]
async fn test_strict_policy_malformed_file_is_500() {
    let fx = sample();
    fx.wheel("broken", "not-a-wheel.whl", b"x");
    for uri in [
        "/",
        "/dep-plain",
        "/dep-plain/dep_plain-0.1.0-py3-none-any.whl",
    ] {
        let response = get(fx.app(), uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }
}

#[tokio::test]
async fn test_lenient_policy_skips_malformed_file() {
    let fx = sample();
    fx.wheel("broken", "not-a-wheel.whl", b"x");
    let body = body_json(get(fx.lenient_app(), "/").await).await;
    assert_eq!(body["projects"].as_array().unwrap().len(), 3);

    let response = get(
        fx.lenient_app(),
        "/dep-plain/dep_plain-0.1.0-py3-none-any.whl",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_url_unsafe_filenames_are_never_advertised() {
    let fx = sample();
    fx.wheel("dep-plain", "dep_plain-0.3.0-py3-none-any#frag.whl", b"fragment")
        .wheel("dep-plain", "dep_plain-0.4.0-py3-none-a%41ny.whl", b"percent");

    let response = get(fx.app(), "/dep-plain").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(get(fx.lenient_app(), "/dep-plain").await).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    for file in files {
        let url = file["url"].as_str().unwrap();
        assert!(!url.contains('#') && !url.contains('%'), "{url}");
        let response = get(fx.lenient_app(), url).await;
        assert_eq!(response.status(), StatusCode::OK, "{url}");
    }
}

#[tokio::test]
async fn test_non_wheel_files_are_ignored() {
    let fx = sample();
    fx.wheel("dep-plain", "dep_plain-0.1.0.tar.gz", b"sdist");
    fx.wheel("dep-plain", "README.txt", b"notes");
    let body = body_json(get(fx.app(), "/dep-plain").await).await;
    assert_eq!(body["files"].as_array().unwrap().len(), 3);
}

// -- Content negotiation ------------------------------------------------------

#[tokio::test]
async fn test_html_index_for_browsers() {
    let fx = sample();
    let response = get_with_accept(fx.app(), "/", "text/html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/vnd.pypi.simple.v1+html"
    );
    assert_eq!(header_str(&response, header::VARY), "Accept");
    let html = body_string(response).await;
    assert!(html.contains("<a href=\"/dep-plain/\">dep-plain</a>"));
}

#[tokio::test]
async fn test_html_project_page_has_hash_fragments() {
    let fx = sample();
    let response = get_with_accept(fx.app(), "/dep-old/", "application/vnd.pypi.simple.v1+html").await;
    let html = body_string(response).await;
    assert!(html.contains(&format!(
        "href=\"/dep-old/dep_old-1.0.0-py3-none-any.whl#sha256={}\"",
        sha256_hex(b"old 1.0.0")
    )));
}

#[tokio::test]
async fn test_json_preferred_by_installers() {
    let fx = sample();
    let response = get_with_accept(
        fx.app(),
        "/dep-old",
        "application/vnd.pypi.simple.v1+json, application/vnd.pypi.simple.v1+html;q=0.2, text/html;q=0.01",
    )
    .await;
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/vnd.pypi.simple.v1+json"
    );
}

// -- Health checks ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let fx = Fixture::new();
    let response = get(fx.app(), "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let fx = Fixture::new();
    let response = get(fx.app(), "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_readiness_check_missing_root_is_503() {
    let fx = Fixture::new();
    let config = AppConfig {
        artifact_root: fx.root().join("gone"),
        ..AppConfig::default()
    };
    let app = wheelhouse_api::app(AppState::new(config));
    let response = get(app, "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- Metrics and OpenAPI ------------------------------------------------------

#[tokio::test]
async fn test_metrics_endpoint_absent_without_handle() {
    let fx = Fixture::new();
    let response = get(fx.app(), "/_/metrics").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_renders_handle() {
    let fx = Fixture::new();
    let recorder = PrometheusBuilder::new().build_recorder();
    let state = AppState::new(fx.config(ScanPolicy::Strict)).with_metrics(recorder.handle());
    let response = get(wheelhouse_api::app(state), "/_/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(header_str(&response, header::CONTENT_TYPE).starts_with("text/plain"));
}

#[tokio::test]
async fn test_project_named_metrics_is_reachable() {
    let fx = Fixture::new();
    fx.wheel("metrics", "metrics-0.1.0-py3-none-any.whl", b"m");
    let body = body_json(get(fx.app(), "/metrics").await).await;
    assert_eq!(body["name"], "metrics");
    assert_eq!(body["versions"], serde_json::json!(["0.1.0"]));
}

#[tokio::test]
async fn test_openapi_spec_served() {
    let fx = Fixture::new();
    let response = get(fx.app(), "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"].get("/{project_name}").is_some());
}
