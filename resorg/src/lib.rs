#![forbid(unsafe_code)]
//! Deduplicating store and set algebra for `.resx` localization resources.
//!
//! resorg consolidates localized string resources parsed from many `.resx`
//! files across many builds into one content-addressed SQLite store, and
//! combines such stores with set semantics (union, difference, intersection)
//! at the granularity of invariant resource keys per file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use resorg::{ResourceStore, StderrSink};
//!
//! let mut sink = StderrSink;
//! let current = ResourceStore::read_from(Path::new("src/Forms"), &mut sink)?;
//! let previous = ResourceStore::read_from(Path::new("resources.db"), &mut sink)?;
//!
//! // Accumulate this build's resources into the store and persist atomically.
//! let merged = previous.add(&current);
//! merged.save_atomic(Path::new("resources.db"), &mut sink)?;
//!
//! // Resources present in both builds only:
//! let common = previous.intersect(&current);
//! common.export(Path::new("common.zip"))?;
//! # Ok::<(), resorg::Error>(())
//! ```
//!
//! # Model
//!
//! - [`InvariantKey`]: the content-derived identity of a resource (name,
//!   file scope, type, default value, comment); the deduplication unit.
//! - [`ResourceEntry`]: one occurrence of a resource in a file, with its
//!   translations keyed by language tag.
//! - [`ResourceFile`]: the ordered entries parsed from one `.resx` file.
//! - [`ResourceStore`]: all files keyed by relative path; the unit of
//!   persistence and of set algebra.
//!
//! Duplicate names within a file and conflicting translations across files
//! are data-quality findings, not errors: they are reported through a
//! [`DiagnosticSink`] and processing continues deterministically.

pub mod archive;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod file;
pub mod resx;
pub mod store;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    diagnostics::{Diagnostic, DiagnosticSink, MemorySink, StderrSink},
    error::Error,
    file::ResourceFile,
    store::ResourceStore,
    types::{InvariantKey, ResourceEntry},
};
