//! # wheelhouse-store: Filesystem Artifact Store
//!
//! A read-only view over a directory of wheels laid out as
//! `{root}/{family}/{dist_dir}/{file}.whl`. The store never writes, never
//! caches, and never memoizes digests: every [`ArtifactStore::list_all()`]
//! call rescans and every [`ArtifactStore::hash()`] call rereads the file.
//!
//! ## Per-Item Results
//!
//! Enumeration yields `Result<Artifact, StoreError>` per file. A malformed
//! filename surfaces as [`StoreError::Parse`] for that one item; whether it
//! fails the surrounding request is the caller's decision.

pub mod digest;
pub mod error;
pub mod store;

pub use digest::{sha256_file, sha256_reader, Sha256Digest};
pub use error::StoreError;
pub use store::{Artifact, ArtifactIter, ArtifactStore, DEFAULT_DIST_DIR};
