//! # Artifact Store
//!
//! Enumerates wheels under `{root}/{family}/{dist_dir}/*.whl`, one family
//! directory per project build tree. Entries are visited in lexicographic
//! order at both levels so enumeration order is deterministic.
//!
//! Only real directories are descended into and only regular files are
//! considered. Symlinks are skipped at every level (family, dist directory,
//! file) so a scan never leaves the tree.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wheelhouse_core::{ProjectName, WheelFilename, WHEEL_EXTENSION};

use crate::digest::{sha256_file, Sha256Digest};
use crate::error::StoreError;

/// Subdirectory of each family that holds built wheels.
pub const DEFAULT_DIST_DIR: &str = "dist";

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// One wheel on disk, with its filename already decoded.
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
    filename: String,
    wheel: WheelFilename,
    size: u64,
}

impl Artifact {
    /// Decode the file at `path`.
    ///
    /// Fails with [`StoreError::Parse`] if the filename is not a valid wheel
    /// name, or [`StoreError::Io`] if its metadata cannot be read.
    pub fn from_path(path: PathBuf) -> Result<Self, StoreError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::NonUtf8Filename(path.clone()))?
            .to_string();
        let wheel = WheelFilename::parse(&filename)?;
        let size = fs::metadata(&path)
            .map_err(|e| StoreError::io(&path, e))?
            .len();
        Ok(Self {
            path,
            filename,
            wheel,
            size,
        })
    }

    /// Absolute or root-relative path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw filename, extension included.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The decoded filename.
    pub fn wheel(&self) -> &WheelFilename {
        &self.wheel
    }

    /// Canonical project this artifact belongs to.
    pub fn project(&self) -> ProjectName {
        self.wheel.project()
    }

    /// Raw version string from the filename.
    pub fn version(&self) -> &str {
        &self.wheel.version
    }

    /// Size in bytes at enumeration time.
    pub fn size(&self) -> u64 {
        self.size
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Read-only store rooted at a directory of project build trees.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    dist_dir: String,
}

impl ArtifactStore {
    /// Create a store using the default `dist` subdirectory convention.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_dist_dir(root, DEFAULT_DIST_DIR)
    }

    /// Create a store whose families keep wheels under `dist_dir`.
    pub fn with_dist_dir(root: impl Into<PathBuf>, dist_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            dist_dir: dist_dir.into(),
        }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The per-family subdirectory holding wheels.
    pub fn dist_dir(&self) -> &str {
        &self.dist_dir
    }

    /// Whether the root exists and can be listed.
    pub fn is_available(&self) -> bool {
        fs::read_dir(&self.root).is_ok()
    }

    /// Start a fresh scan.
    ///
    /// The returned iterator is lazy: family directories are listed up
    /// front, but each family's files are only read when the iterator
    /// reaches it. A missing root is an empty store.
    pub fn list_all(&self) -> ArtifactIter {
        let (families, pending) = match sorted_entries(&self.root, EntryKind::Directory) {
            Ok(families) => (families, None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(root = %self.root.display(), "artifact root does not exist");
                (Vec::new(), None)
            }
            Err(e) => (Vec::new(), Some(StoreError::io(&self.root, e))),
        };
        ArtifactIter {
            families: families.into_iter(),
            files: Vec::new().into_iter(),
            dist_dir: self.dist_dir.clone(),
            pending,
        }
    }

    /// Open an artifact for reading. The handle is owned by the caller.
    pub fn open(&self, artifact: &Artifact) -> Result<File, StoreError> {
        File::open(artifact.path()).map_err(|e| StoreError::io(artifact.path(), e))
    }

    /// SHA-256 of the artifact's current bytes. Rereads the file every call.
    pub fn hash(&self, artifact: &Artifact) -> Result<Sha256Digest, StoreError> {
        sha256_file(artifact.path())
    }
}

/// Lazy iterator over one scan of the store.
#[derive(Debug)]
pub struct ArtifactIter {
    families: std::vec::IntoIter<PathBuf>,
    files: std::vec::IntoIter<PathBuf>,
    dist_dir: String,
    pending: Option<StoreError>,
}

impl Iterator for ArtifactIter {
    type Item = Result<Artifact, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(err) = self.pending.take() {
                return Some(Err(err));
            }
            if let Some(path) = self.files.next() {
                return Some(Artifact::from_path(path));
            }
            let family = self.families.next()?;
            let dist = family.join(&self.dist_dir);
            match fs::symlink_metadata(&dist) {
                Ok(meta) if meta.file_type().is_dir() => {}
                Ok(_) => {
                    tracing::debug!(dist = %dist.display(), "skipping non-directory dist entry");
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::trace!(family = %family.display(), "family has no dist directory");
                    continue;
                }
                Err(e) => return Some(Err(StoreError::io(dist, e))),
            }
            match sorted_entries(&dist, EntryKind::Wheel) {
                Ok(files) => self.files = files.into_iter(),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::trace!(family = %family.display(), "family has no dist directory");
                }
                Err(e) => return Some(Err(StoreError::io(dist, e))),
            }
        }
    }
}

#[derive(Clone, Copy)]
enum EntryKind {
    Directory,
    Wheel,
}

/// List `dir`, keeping entries of `kind`, sorted by path.
fn sorted_entries(dir: &Path, kind: EntryKind) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let keep = match kind {
            EntryKind::Directory => file_type.is_dir(),
            EntryKind::Wheel => {
                file_type.is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .map_or(true, |n| n.ends_with(WHEEL_EXTENSION))
            }
        };
        if keep {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
