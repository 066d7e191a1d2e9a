//! Error types for version history operations.

use thiserror::Error;

use atelier_types::VersionId;

/// Errors that can occur in version history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Durable read or write failed. Never dropped silently: it represents
    /// possible loss of durable user data.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Restore requested for a version that does not exist.
    #[error("version not found: {version_id}")]
    VersionNotFound { version_id: VersionId },
}
