//! # Repository Index Service
//!
//! The three index operations, each a pure function of the store's state at
//! the moment of the scan plus the request parameters:
//!
//! - [`IndexService::list_projects()`]: distinct canonical names, ascending.
//! - [`IndexService::list_files()`]: one project's files, hashes and versions.
//! - [`IndexService::get_file()`]: resolve exactly one artifact for download.
//!
//! Every call rescans the store and rehashes what it returns. All methods are
//! synchronous and block on the filesystem; the HTTP layer runs them on the
//! blocking pool.
//!
//! ## Scan Policy
//!
//! Under [`ScanPolicy::Strict`] a single malformed filename anywhere in the
//! scanned tree fails the whole operation. [`ScanPolicy::Lenient`] logs and
//! skips invalid artifacts instead. I/O failures always propagate.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use wheelhouse_core::{is_valid_identifier, ProjectName, Version, WHEEL_EXTENSION};
use wheelhouse_store::{Artifact, ArtifactStore, StoreError};

use crate::views::{FileEntry, Hashes, IndexView, Meta, PackageView, ProjectEntry};

/// Counter of artifacts skipped under [`ScanPolicy::Lenient`].
pub const INVALID_ARTIFACTS_TOTAL: &str = "wheelhouse_invalid_artifacts_total";

/// How a scan treats artifacts whose filenames cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPolicy {
    /// Fail the operation.
    #[default]
    Strict,
    /// Log a warning and skip the file.
    Lenient,
}

impl ScanPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan policy name other than `strict` or `lenient`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown scan policy {0:?}: expected \"strict\" or \"lenient\"")]
pub struct UnknownScanPolicy(pub String);

impl FromStr for ScanPolicy {
    type Err = UnknownScanPolicy;

    /// Case-insensitive, so `WHEELHOUSE_SCAN_POLICY=Lenient` works.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("strict") {
            Ok(Self::Strict)
        } else if s.eq_ignore_ascii_case("lenient") {
            Ok(Self::Lenient)
        } else {
            Err(UnknownScanPolicy(s.to_string()))
        }
    }
}

/// Errors from index operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Project path segment is outside `[A-Za-z0-9_-]+`.
    #[error("invalid project name {0:?}: must match [A-Za-z0-9_-]+")]
    InvalidProjectName(String),

    /// Zero or several artifacts matched a download request.
    #[error("no unique artifact {filename} for project {project} ({matches} matches)")]
    NotFound {
        project: String,
        filename: String,
        matches: usize,
    },

    /// The store failed or held an invalid artifact under strict policy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reject project path segments outside `[A-Za-z0-9_-]+`.
pub fn validate_project_name(name: &str) -> Result<(), ServiceError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(ServiceError::InvalidProjectName(name.to_string()))
    }
}

/// Index operations over one artifact store.
#[derive(Debug, Clone)]
pub struct IndexService {
    store: ArtifactStore,
    policy: ScanPolicy,
}

impl IndexService {
    pub fn new(store: ArtifactStore, policy: ScanPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn policy(&self) -> ScanPolicy {
        self.policy
    }

    /// A fresh scan with the scan policy applied.
    fn scan(&self) -> impl Iterator<Item = Result<Artifact, StoreError>> {
        let policy = self.policy;
        self.store.list_all().filter(move |item| match item {
            Err(e) if policy == ScanPolicy::Lenient && e.is_invalid_artifact() => {
                tracing::warn!(error = %e, "skipping invalid artifact");
                metrics::counter!(INVALID_ARTIFACTS_TOTAL).increment(1);
                false
            }
            _ => true,
        })
    }

    /// Artifacts whose canonical project equals `project`.
    fn project_artifacts<'a>(
        &self,
        project: &'a ProjectName,
    ) -> impl Iterator<Item = Result<Artifact, StoreError>> + 'a {
        self.scan().filter(move |item| match item {
            Ok(artifact) => artifact.project() == *project,
            Err(_) => true,
        })
    }

    /// Every project with at least one artifact, sorted ascending.
    pub fn list_projects(&self) -> Result<IndexView, ServiceError> {
        let mut names = BTreeSet::new();
        for artifact in self.scan() {
            names.insert(artifact?.project());
        }
        Ok(IndexView {
            meta: Meta::default(),
            projects: names
                .into_iter()
                .map(|name| ProjectEntry {
                    name: name.into_inner(),
                })
                .collect(),
        })
    }

    /// Files and versions of one project.
    ///
    /// `project_segment` is matched after canonicalization and reused
    /// verbatim in each file's download URL. A project with no artifacts
    /// yields an empty view, not an error.
    pub fn list_files(&self, project_segment: &str) -> Result<PackageView, ServiceError> {
        let project = ProjectName::new(project_segment);
        let mut files = Vec::new();
        let mut versions: Vec<(String, Version)> = Vec::new();

        for artifact in self.project_artifacts(&project) {
            let artifact = artifact?;
            let digest = self.store.hash(&artifact)?;

            let raw_version = artifact.version();
            if !versions.iter().any(|(v, _)| v == raw_version) {
                versions.push((
                    raw_version.to_string(),
                    artifact.wheel().parsed_version().clone(),
                ));
            }

            files.push(FileEntry {
                filename: artifact.filename().to_string(),
                url: format!("/{project_segment}/{}", artifact.filename()),
                hashes: Hashes {
                    sha256: digest.to_hex(),
                },
                requires_python: None,
                core_metadata: false,
                size: artifact.size(),
                yanked: false,
                upload_time: None,
            });
        }

        // Stable: equal versions keep enumeration order.
        versions.sort_by(|(_, a), (_, b)| b.cmp(a));

        tracing::debug!(project = %project, files = files.len(), "listed project files");

        Ok(PackageView {
            meta: Meta::default(),
            name: project.into_inner(),
            versions: versions.into_iter().map(|(raw, _)| raw).collect(),
            files,
        })
    }

    /// Resolve `{wheel_name}.whl` within `project_name`.
    ///
    /// Succeeds only when exactly one artifact matches. Zero and several
    /// matches are both reported as [`ServiceError::NotFound`].
    pub fn get_file(&self, project_name: &str, wheel_name: &str) -> Result<Artifact, ServiceError> {
        validate_project_name(project_name)?;
        let project = ProjectName::new(project_name);
        let target = format!("{wheel_name}{WHEEL_EXTENSION}");

        let mut matches = Vec::new();
        for artifact in self.project_artifacts(&project) {
            let artifact = artifact?;
            if artifact.filename() == target {
                matches.push(artifact);
            }
        }

        if matches.len() == 1 {
            return Ok(matches.swap_remove(0));
        }
        if matches.len() > 1 {
            tracing::warn!(
                project = %project,
                filename = %target,
                matches = matches.len(),
                "ambiguous artifact request"
            );
        }
        Err(ServiceError::NotFound {
            project: project.into_inner(),
            filename: target,
            matches: matches.len(),
        })
    }
}
