//! # Version Ordering
//!
//! Structured versions per the packaging version-specifier standard:
//!
//! ```text
//! [v][N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]
//! ```
//!
//! ## Ordering
//!
//! Versions are compared on `(epoch, release, pre, post, dev, local)`:
//!
//! - trailing zeros in the release are insignificant (`1.0 == 1.0.0`);
//! - a dev release of a final version sorts before its pre-releases
//!   (`1.0.dev0 < 1.0a1 < 1.0`);
//! - post-releases sort after the final release (`1.0 < 1.0.post1`);
//! - a local label sorts after the same public version, numeric local
//!   parts sort after alphanumeric ones.
//!
//! Parsing is lenient in the same ways the standard's normalization is:
//! case-insensitive, optional `v` prefix, `alpha`/`beta`/`c`/`pre`/`preview`
//! spellings, `rev`/`r` for post, implicit post numbers (`1.0-1`), and
//! `.`/`-`/`_` separators between segments.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::VersionError;

/// Pre-release phase. Declaration order is sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreRelease {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::ReleaseCandidate => "rc",
        }
    }
}

/// One dot-separated part of a local version label.
///
/// Declaration order matters: any number sorts after any text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Text(String),
    Number(u64),
}

impl std::fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A comparison slot that may be absent in a way that sorts low or high.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Bound<T> {
    NegInf,
    Finite(T),
    PosInf,
}

type SortKey<'a> = (
    u64,
    &'a [u64],
    Bound<(PreRelease, u64)>,
    Bound<u64>,
    Bound<u64>,
    Bound<&'a [LocalSegment]>,
);

/// A parsed version.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl Version {
    /// Parse a version string.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        Parser::new(input).parse()
    }

    /// The epoch (`N!`), zero when absent.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Release components as written, trailing zeros included.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Whether this is a pre-release or a dev release.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Whether a local label (`+...`) is present.
    pub fn is_local(&self) -> bool {
        !self.local.is_empty()
    }

    fn sort_key(&self) -> SortKey<'_> {
        let significant = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);

        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => Bound::NegInf,
            (None, _, _) => Bound::PosInf,
            (Some(p), _, _) => Bound::Finite(p),
        };
        let post = self.post.map_or(Bound::NegInf, Bound::Finite);
        let dev = self.dev.map_or(Bound::PosInf, Bound::Finite);
        let local = if self.local.is_empty() {
            Bound::NegInf
        } else {
            Bound::Finite(self.local.as_slice())
        };

        (
            self.epoch,
            &self.release[..significant],
            pre,
            post,
            dev,
            local,
        )
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

/// Renders the normalized form.
impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{n}", phase.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

/// Compare two version strings structurally.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

const PRE_LABELS: &[(&str, PreRelease)] = &[
    ("preview", PreRelease::ReleaseCandidate),
    ("alpha", PreRelease::Alpha),
    ("beta", PreRelease::Beta),
    ("pre", PreRelease::ReleaseCandidate),
    ("rc", PreRelease::ReleaseCandidate),
    ("a", PreRelease::Alpha),
    ("b", PreRelease::Beta),
    ("c", PreRelease::ReleaseCandidate),
];

const POST_LABELS: &[&str] = &["post", "rev", "r"];

fn is_separator(b: u8) -> bool {
    matches!(b, b'.' | b'-' | b'_')
}

struct Parser<'a> {
    original: &'a str,
    input: Vec<u8>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(original: &'a str) -> Self {
        Self {
            original,
            input: original.trim().to_ascii_lowercase().into_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        match self.peek() {
            Some(b) if is_separator(b) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn eat_label(&mut self, label: &str) -> bool {
        if self.input[self.pos..].starts_with(label.as_bytes()) {
            self.pos += label.len();
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<Option<u64>, VersionError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let digits = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("non-ASCII digits"))?;
        digits
            .parse::<u64>()
            .map(Some)
            .map_err(|_| self.error(format!("number {digits} is out of range")))
    }

    fn error(&self, reason: impl Into<String>) -> VersionError {
        VersionError::invalid(self.original, reason)
    }

    fn parse(mut self) -> Result<Version, VersionError> {
        if self.input.is_empty() {
            return Err(VersionError::Empty);
        }

        self.eat(b'v');

        let first = self
            .number()?
            .ok_or_else(|| self.error("expected a release number"))?;
        let mut epoch = 0;
        let mut release = Vec::new();
        if self.eat(b'!') {
            epoch = first;
            release.push(
                self.number()?
                    .ok_or_else(|| self.error("expected a release number after epoch"))?,
            );
        } else {
            release.push(first);
        }
        while self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            if let Some(n) = self.number()? {
                release.push(n);
            }
        }

        let pre = self.pre_release()?;
        let post = self.post_release()?;
        let dev = self.dev_release()?;
        let local = self.local()?;

        if self.pos != self.input.len() {
            let rest = String::from_utf8_lossy(&self.input[self.pos..]).into_owned();
            return Err(self.error(format!("unexpected trailing input {rest:?}")));
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    fn pre_release(&mut self) -> Result<Option<(PreRelease, u64)>, VersionError> {
        let checkpoint = self.pos;
        self.eat_separator();
        for (label, phase) in PRE_LABELS {
            if self.eat_label(label) {
                self.eat_separator();
                let n = self.number()?.unwrap_or(0);
                return Ok(Some((*phase, n)));
            }
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn post_release(&mut self) -> Result<Option<u64>, VersionError> {
        if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            return self.number();
        }
        let checkpoint = self.pos;
        self.eat_separator();
        for label in POST_LABELS {
            if self.eat_label(label) {
                self.eat_separator();
                return Ok(Some(self.number()?.unwrap_or(0)));
            }
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn dev_release(&mut self) -> Result<Option<u64>, VersionError> {
        let checkpoint = self.pos;
        self.eat_separator();
        if self.eat_label("dev") {
            self.eat_separator();
            return Ok(Some(self.number()?.unwrap_or(0)));
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn local(&mut self) -> Result<Vec<LocalSegment>, VersionError> {
        if !self.eat(b'+') {
            return Ok(Vec::new());
        }
        let mut segments = Vec::new();
        loop {
            let start = self.pos;
            while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
                self.pos += 1;
            }
            if start == self.pos {
                return Err(self.error("empty local version segment"));
            }
            let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
            let segment = if text.bytes().all(|b| b.is_ascii_digit()) {
                text.parse::<u64>()
                    .map(LocalSegment::Number)
                    .map_err(|_| self.error(format!("local segment {text} is out of range")))?
            } else {
                LocalSegment::Text(text)
            };
            segments.push(segment);
            if !self.eat_separator() {
                break;
            }
        }
        Ok(segments)
    }
}
