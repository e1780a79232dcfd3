//! # Simple Repository API Views
//!
//! Response-only projections of the store. Wire keys follow the Simple
//! Repository API JSON format exactly; the hyphenated keys (`api-version`,
//! `requires-python`, `core-metadata`, `upload-time`) are mapped by serde
//! renames from their underscored field names, so clients of existing
//! indexes parse these documents unchanged.
//!
//! The HTML flavour of the same API is rendered from the same views through
//! `handlebars` templates.

use std::sync::OnceLock;

use handlebars::{Handlebars, RenderError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Simple Repository API version implemented by this server.
pub const API_VERSION: &str = "1.1";

/// Response metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    #[serde(rename = "api-version")]
    pub api_version: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
        }
    }
}

/// `GET /`: every project with at least one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IndexView {
    pub meta: Meta,
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProjectEntry {
    /// Canonical project name.
    pub name: String,
}

/// `GET /{project}`: one project's files and versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackageView {
    pub meta: Meta,
    /// Canonical project name.
    pub name: String,
    /// Distinct versions, highest first.
    pub versions: Vec<String>,
    pub files: Vec<FileEntry>,
}

/// One downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    pub filename: String,
    /// Download URL, relative to the server root.
    pub url: String,
    pub hashes: Hashes,
    /// Always `null`: the index does not read wheel metadata.
    #[serde(rename = "requires-python")]
    pub requires_python: Option<String>,
    /// Always `false`: no separate metadata files are served.
    #[serde(rename = "core-metadata")]
    pub core_metadata: bool,
    /// Size in bytes.
    pub size: u64,
    pub yanked: bool,
    /// Always `null`: upload time is not derivable from the artifact.
    #[serde(rename = "upload-time")]
    pub upload_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Hashes {
    /// Lowercase hex SHA-256 of the file bytes.
    pub sha256: String,
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="pypi:repository-version" content="{{api_version}}">
    <title>Simple index</title>
  </head>
  <body>
    <h1>Simple index</h1>
{{#each projects}}
    <a href="/{{name}}/">{{name}}</a><br/>
{{/each}}
  </body>
</html>
"#;

const PACKAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="pypi:repository-version" content="{{api_version}}">
    <title>Links for {{name}}</title>
  </head>
  <body>
    <h1>Links for {{name}}</h1>
{{#each files}}
    <a href="{{url}}#sha256={{hashes.sha256}}">{{filename}}</a><br/>
{{/each}}
  </body>
</html>
"#;

/// Shared engine. Values are HTML-escaped by handlebars' default escape fn.
fn engine() -> &'static Handlebars<'static> {
    static ENGINE: OnceLock<Handlebars<'static>> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars
    })
}

impl IndexView {
    /// Render as the HTML Simple Repository API.
    pub fn to_html(&self) -> Result<String, RenderError> {
        engine().render_template(
            INDEX_TEMPLATE,
            &json!({
                "api_version": self.meta.api_version,
                "projects": self.projects,
            }),
        )
    }
}

impl PackageView {
    /// Render as the HTML Simple Repository API.
    pub fn to_html(&self) -> Result<String, RenderError> {
        engine().render_template(
            PACKAGE_TEMPLATE,
            &json!({
                "api_version": self.meta.api_version,
                "name": self.name,
                "files": self.files,
            }),
        )
    }
}
