//! Version entry types.

use serde::{Deserialize, Serialize};

use atelier_types::{now_ms, ContentKind, ProjectId, UserId, VersionId};

/// One immutable snapshot of a project's generated content.
///
/// Entries are created on commit and never mutated, reordered, or deleted by
/// this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Unique identifier, generated at commit time.
    pub id: VersionId,
    /// Project this entry belongs to.
    pub project_id: ProjectId,
    /// Account identifier of the author.
    pub author_id: UserId,
    /// Display label of the author at commit time.
    pub author_label: String,
    /// Epoch milliseconds when the entry was committed.
    pub timestamp_ms: u64,
    /// Full content payload, not a diff.
    pub content: String,
    /// Which content field this snapshot captures.
    pub kind: ContentKind,
}

impl VersionEntry {
    /// Creates a new entry stamped with a fresh id and the current time.
    pub fn new(
        project_id: impl Into<ProjectId>,
        author_id: impl Into<UserId>,
        author_label: impl Into<String>,
        content: impl Into<String>,
        kind: ContentKind,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            author_id: author_id.into(),
            author_label: author_label.into(),
            timestamp_ms: now_ms(),
            content: content.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = VersionEntry::new(
            "p-1",
            "user-1",
            "alice@example.com",
            "<main/>",
            ContentKind::Markup,
        );

        assert!(!entry.id.is_empty());
        assert_eq!(entry.project_id, "p-1");
        assert_eq!(entry.kind, ContentKind::Markup);
        assert!(entry.timestamp_ms > 0);
    }

    #[test]
    fn test_entries_get_distinct_ids() {
        let a = VersionEntry::new("p-1", "u", "u@example.com", "a", ContentKind::Markup);
        let b = VersionEntry::new("p-1", "u", "u@example.com", "b", ContentKind::Markup);
        assert_ne!(a.id, b.id);
    }
}
