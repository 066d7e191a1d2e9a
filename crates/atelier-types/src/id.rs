//! Identifier aliases.

/// Unique identifier for a project.
pub type ProjectId = String;

/// Stable identifier for a user account.
pub type UserId = String;

/// Unique identifier for a version entry.
pub type VersionId = String;
