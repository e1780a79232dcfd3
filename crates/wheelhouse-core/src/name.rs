//! # Project Name Canonicalization
//!
//! A project may be spelled `Dep-Plain`, `dep_plain` or `DEP.PLAIN`; all of
//! them name the same project. The canonical form lowercases the input and
//! collapses every maximal run of `.`, `_` and `-` into a single `-`.
//!
//! ## Identifier Validation
//!
//! Request path segments are checked against `[A-Za-z0-9_-]+` by
//! [`is_valid_identifier()`] before they reach the store.

use serde::{Deserialize, Serialize};

/// Canonicalize a project identifier.
///
/// Total and pure: every input yields a result, and the result of
/// canonicalizing a canonical name is the name itself.
pub fn canonicalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator_run = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator_run {
                out.push('-');
                in_separator_run = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_separator_run = false;
        }
    }
    out
}

/// Whether `name` matches `[A-Za-z0-9_-]+`.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// A canonical project name.
///
/// The inner value is always the output of [`canonicalize()`]; there is no
/// way to construct a `ProjectName` from a non-canonical string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Canonicalize `raw` into a project name.
    pub fn new(raw: &str) -> Self {
        Self(canonicalize(raw))
    }

    /// Return the canonical name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, returning the canonical string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ProjectName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProjectName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
