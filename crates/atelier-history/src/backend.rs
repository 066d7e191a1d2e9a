//! History storage backends.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use atelier_types::{ContentKind, ProjectId};

use crate::entry::VersionEntry;
use crate::Result;

/// A trait for durable history storage.
///
/// Backends hold two tables: the append-only version log and the live
/// content fields per project. Implementations map their own failures to
/// [`crate::HistoryError::Persistence`].
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Appends a version entry. Entries are never updated or deleted.
    async fn insert_version(&self, entry: VersionEntry) -> Result<()>;

    /// Lists a project's entries, newest first. Empty when none exist.
    async fn list_versions(&self, project_id: &str) -> Result<Vec<VersionEntry>>;

    /// Fetches one entry by id.
    async fn get_version(&self, project_id: &str, version_id: &str)
        -> Result<Option<VersionEntry>>;

    /// Overwrites a project's live content of the given kind.
    async fn write_content(&self, project_id: &str, kind: ContentKind, content: &str)
        -> Result<()>;

    /// Reads a project's live content of the given kind.
    async fn read_content(&self, project_id: &str, kind: ContentKind) -> Result<Option<String>>;
}

/// An in-memory history backend for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    versions: RwLock<HashMap<ProjectId, Vec<VersionEntry>>>,
    content: RwLock<HashMap<(ProjectId, ContentKind), String>>,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryBackend for MemoryBackend {
    async fn insert_version(&self, entry: VersionEntry) -> Result<()> {
        self.versions
            .write()
            .entry(entry.project_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn list_versions(&self, project_id: &str) -> Result<Vec<VersionEntry>> {
        let mut entries: Vec<VersionEntry> = self
            .versions
            .read()
            .get(project_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default();

        // Append order already puts the newest first after the reverse; the
        // stable sort keeps that tie-break when timestamps collide.
        entries.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        Ok(entries)
    }

    async fn get_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Option<VersionEntry>> {
        Ok(self
            .versions
            .read()
            .get(project_id)
            .and_then(|entries| entries.iter().find(|e| e.id == version_id))
            .cloned())
    }

    async fn write_content(
        &self,
        project_id: &str,
        kind: ContentKind,
        content: &str,
    ) -> Result<()> {
        self.content
            .write()
            .insert((project_id.to_string(), kind), content.to_string());
        Ok(())
    }

    async fn read_content(&self, project_id: &str, kind: ContentKind) -> Result<Option<String>> {
        Ok(self
            .content
            .read()
            .get(&(project_id.to_string(), kind))
            .cloned())
    }
}
