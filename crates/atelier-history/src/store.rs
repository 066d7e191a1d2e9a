//! Version store: commit, history, restore.

use std::sync::Arc;

use tracing::{debug, info};

use atelier_types::{ContentKind, ProjectId, UserId, VersionId};

use crate::backend::{HistoryBackend, MemoryBackend};
use crate::entry::VersionEntry;
use crate::error::HistoryError;
use crate::Result;

/// Append-only version history per project, with restore semantics.
///
/// Commits reach the backend before they are surfaced anywhere, so a history
/// entry is never presented to a caller unless it durably exists. Restore is
/// non-destructive: it writes an entry's content back into the project's live
/// field and never edits, reorders, or deletes the log.
pub struct VersionStore {
    backend: Arc<dyn HistoryBackend>,
}

impl VersionStore {
    /// Creates a store over the given backend.
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self { backend }
    }

    /// Creates a store over an in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Commits a full content snapshot, returning the persisted entry.
    pub async fn commit(
        &self,
        project_id: impl Into<ProjectId>,
        author_id: impl Into<UserId>,
        author_label: impl Into<String>,
        content: impl Into<String>,
        kind: ContentKind,
    ) -> Result<VersionEntry> {
        let entry = VersionEntry::new(project_id, author_id, author_label, content, kind);

        // Durable write first; the entry is returned only once it exists.
        self.backend.insert_version(entry.clone()).await?;

        debug!(
            project = %entry.project_id,
            version = %entry.id,
            kind = %entry.kind,
            "Version committed"
        );
        Ok(entry)
    }

    /// All entries for a project, newest first. Empty when none exist.
    pub async fn history(&self, project_id: &str) -> Result<Vec<VersionEntry>> {
        self.backend.list_versions(project_id).await
    }

    /// Restores a version into the project's live content field.
    ///
    /// Fails with [`HistoryError::VersionNotFound`] if the id is unknown; the
    /// live content and the log are left untouched in that case.
    pub async fn restore(&self, project_id: &str, version_id: &VersionId) -> Result<VersionEntry> {
        let entry = self
            .backend
            .get_version(project_id, version_id)
            .await?
            .ok_or_else(|| HistoryError::VersionNotFound {
                version_id: version_id.clone(),
            })?;

        self.backend
            .write_content(project_id, entry.kind, &entry.content)
            .await?;

        info!(
            project = %project_id,
            version = %entry.id,
            kind = %entry.kind,
            "Version restored"
        );
        Ok(entry)
    }

    /// Current live content of the given kind, if any has been written.
    pub async fn content(&self, project_id: &str, kind: ContentKind) -> Result<Option<String>> {
        self.backend.read_content(project_id, kind).await
    }
}
