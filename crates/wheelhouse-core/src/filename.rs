//! # Wheel Filename Parsing
//!
//! Decodes `{distribution}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.
//! Only the distribution and version carry meaning for the index; the tags
//! are kept on the parsed value for logging and nothing else.

use crate::error::ParseError;
use crate::name::ProjectName;
use crate::version::Version;

/// File extension of an installable artifact, including the dot.
pub const WHEEL_EXTENSION: &str = ".whl";

/// A parsed wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    /// Distribution name exactly as it appears in the filename.
    pub distribution: String,
    /// Version string exactly as it appears in the filename.
    pub version: String,
    /// Optional build tag (always starts with a digit).
    pub build_tag: Option<String>,
    pub python_tag: String,
    pub abi_tag: String,
    pub platform_tag: String,
    parsed_version: Version,
}

impl WheelFilename {
    /// Parse a bare filename (no directory components).
    pub fn parse(filename: &str) -> Result<Self, ParseError> {
        let stem = filename
            .strip_suffix(WHEEL_EXTENSION)
            .ok_or_else(|| ParseError::NotAWheel {
                filename: filename.to_string(),
            })?;

        let parts: Vec<&str> = stem.split('-').collect();
        let (distribution, version, build_tag, python_tag, abi_tag, platform_tag) =
            match parts.as_slice() {
                [d, v, py, abi, plat] => (*d, *v, None, *py, *abi, *plat),
                [d, v, build, py, abi, plat] => (*d, *v, Some(*build), *py, *abi, *plat),
                _ => {
                    return Err(ParseError::SegmentCount {
                        filename: filename.to_string(),
                        found: parts.len(),
                    })
                }
            };

        let invalid = |segment: &'static str, value: &str| ParseError::InvalidSegment {
            filename: filename.to_string(),
            segment,
            value: value.to_string(),
        };

        if !is_tag_text(distribution) {
            return Err(invalid("distribution", distribution));
        }
        if let Some(build) = build_tag {
            if !build.starts_with(|c: char| c.is_ascii_digit()) || !is_tag_text(build) {
                return Err(invalid("build tag", build));
            }
        }
        for (segment, value) in [
            ("python tag", python_tag),
            ("abi tag", abi_tag),
            ("platform tag", platform_tag),
        ] {
            if !is_tag_text(value) {
                return Err(invalid(segment, value));
            }
        }

        let parsed_version = Version::parse(version).map_err(|source| ParseError::Version {
            filename: filename.to_string(),
            source,
        })?;

        Ok(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build_tag: build_tag.map(str::to_string),
            python_tag: python_tag.to_string(),
            abi_tag: abi_tag.to_string(),
            platform_tag: platform_tag.to_string(),
            parsed_version,
        })
    }

    /// Canonical project name derived from the distribution segment.
    pub fn project(&self) -> ProjectName {
        ProjectName::new(&self.distribution)
    }

    /// Structured version for ordering.
    pub fn parsed_version(&self) -> &Version {
        &self.parsed_version
    }
}

/// Non-empty and within `[A-Za-z0-9_.]`, the wheel filename alphabet.
///
/// Anything outside it (`%`, `#`, `?`, spaces) could not round-trip through
/// a download URL.
fn is_tag_text(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
}
