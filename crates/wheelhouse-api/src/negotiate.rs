//! # Content Negotiation
//!
//! Picks JSON or HTML for the index pages from the `Accept` header.
//! JSON wins ties and is the default when the header is absent or names
//! nothing this server produces. HTML is chosen only when an HTML media
//! range has a strictly higher quality than every JSON-compatible one.

use axum::http::header::ACCEPT;
use axum::http::HeaderMap;

/// Content type of JSON index responses.
pub const SIMPLE_JSON: &str = "application/vnd.pypi.simple.v1+json";

/// Content type of HTML index responses.
pub const SIMPLE_HTML: &str = "application/vnd.pypi.simple.v1+html";

const JSON_RANGES: &[&str] = &[
    SIMPLE_JSON,
    "application/vnd.pypi.simple.latest+json",
    "application/json",
    "application/*",
    "*/*",
];

const HTML_RANGES: &[&str] = &[
    SIMPLE_HTML,
    "application/vnd.pypi.simple.latest+html",
    "text/html",
    "text/*",
];

/// Representation chosen for an index response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

impl ResponseFormat {
    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => SIMPLE_JSON,
            Self::Html => SIMPLE_HTML,
        }
    }

    /// Negotiate from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        negotiate(headers.get(ACCEPT).and_then(|v| v.to_str().ok()))
    }
}

/// Negotiate from a raw `Accept` header value.
pub fn negotiate(accept: Option<&str>) -> ResponseFormat {
    let Some(accept) = accept else {
        return ResponseFormat::Json;
    };

    let mut json_q: f32 = 0.0;
    let mut html_q: f32 = 0.0;
    for range in accept.split(',') {
        let mut params = range.split(';');
        let media = params.next().unwrap_or("").trim().to_ascii_lowercase();
        let q = params
            .filter_map(|p| p.trim().strip_prefix("q="))
            .map(|v| v.trim().parse::<f32>().unwrap_or(0.0))
            .next()
            .unwrap_or(1.0);

        if JSON_RANGES.contains(&media.as_str()) {
            json_q = json_q.max(q);
        }
        if HTML_RANGES.contains(&media.as_str()) {
            html_q = html_q.max(q);
        }
    }

    if html_q > json_q {
        ResponseFormat::Html
    } else {
        ResponseFormat::Json
    }
}
