//! # Atelier History
//!
//! Append-only version history for Atelier projects.
//!
//! Every save produces an immutable [`VersionEntry`] holding the full content
//! of one generated artifact (markup or stylesheet). Entries are appended to
//! a per-project log that is never edited, reordered, or pruned by this
//! subsystem; concurrent commits from different clients simply land in append
//! order. Restoring a version copies its content back into the project's live
//! field and leaves the log untouched, so restores are repeatable in both
//! directions.
//!
//! Storage is pluggable through [`HistoryBackend`]; [`MemoryBackend`] serves
//! tests and single-process deployments.

mod backend;
mod entry;
mod error;
mod store;

pub use backend::{HistoryBackend, MemoryBackend};
pub use entry::VersionEntry;
pub use error::HistoryError;
pub use store::VersionStore;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
