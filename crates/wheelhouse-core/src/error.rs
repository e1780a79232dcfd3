//! # Error Types
//!
//! Parse failures for artifact filenames and version strings. Both carry the
//! offending input so a log line identifies the file without extra context.

use thiserror::Error;

/// A version string that does not follow the version-specifier grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string was empty after trimming.
    #[error("empty version string")]
    Empty,

    /// The string contained a component the grammar does not allow.
    #[error("invalid version {input:?}: {reason}")]
    Invalid {
        /// The raw version string.
        input: String,
        /// Which part of the grammar was violated.
        reason: String,
    },
}

impl VersionError {
    pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// An artifact filename that cannot be decoded into (distribution, version).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The filename does not end with the wheel extension.
    #[error("{filename:?} is not a wheel: missing .whl extension")]
    NotAWheel {
        /// The offending filename.
        filename: String,
    },

    /// The stem does not split into 5 or 6 dash-delimited segments.
    #[error("{filename:?} has {found} dash-delimited segments, expected 5 or 6")]
    SegmentCount {
        /// The offending filename.
        filename: String,
        /// Number of segments found.
        found: usize,
    },

    /// A required segment is empty or uses characters outside its grammar.
    #[error("{filename:?} has an invalid {segment} segment {value:?}")]
    InvalidSegment {
        /// The offending filename.
        filename: String,
        /// Segment name (`distribution`, `build tag`, ...).
        segment: &'static str,
        /// The rejected segment text.
        value: String,
    },

    /// The version segment is not a well-formed version.
    #[error("{filename:?} has a malformed version: {source}")]
    Version {
        /// The offending filename.
        filename: String,
        /// Underlying version grammar failure.
        #[source]
        source: VersionError,
    },
}

impl ParseError {
    /// The filename that failed to parse.
    pub fn filename(&self) -> &str {
        match self {
            Self::NotAWheel { filename }
            | Self::SegmentCount { filename, .. }
            | Self::InvalidSegment { filename, .. }
            | Self::Version { filename, .. } => filename,
        }
    }
}
