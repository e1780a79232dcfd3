//! # wheelhouse-core: Foundational Types for the Wheelhouse Index
//!
//! Pure, filesystem-free building blocks shared by the store and the API
//! layer. Nothing in this crate performs I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Canonical names are the grouping key.** [`ProjectName`] can only be
//!    constructed through [`canonicalize()`], so two spellings of the same
//!    project can never be compared in their raw form by accident.
//!
//! 2. **Filenames are parsed, not pattern-matched.** [`WheelFilename::parse()`]
//!    returns a `Result`; callers decide whether a malformed artifact fails
//!    the whole listing or is skipped.
//!
//! 3. **Versions are structured.** [`Version`] implements `Ord` per the
//!    packaging version-specifier rules. Raw version strings are kept only
//!    for display.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wheelhouse-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod filename;
pub mod name;
pub mod version;

pub use error::{ParseError, VersionError};
pub use filename::{WheelFilename, WHEEL_EXTENSION};
pub use name::{canonicalize, is_valid_identifier, ProjectName};
pub use version::{compare, Version};
