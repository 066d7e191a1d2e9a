//! Channel naming for project sessions.

use serde::{Deserialize, Serialize};

use atelier_types::ProjectId;

use crate::error::TransportError;

/// A publish-subscribe channel scoped to one project.
///
/// Rendered on the wire as `project:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectChannel {
    /// Project this channel belongs to.
    project_id: ProjectId,
}

impl ProjectChannel {
    /// Creates a channel for the given project.
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    /// Parses a channel string of the form `project:<id>`.
    pub fn parse(s: &str) -> Result<Self, TransportError> {
        let parts: Vec<&str> = s.splitn(2, ':').collect();
        if parts.len() != 2 || parts[0] != "project" {
            return Err(TransportError::InvalidChannel(format!(
                "missing project prefix: {}",
                s
            )));
        }
        if parts[1].is_empty() {
            return Err(TransportError::InvalidChannel(format!(
                "channel identifier cannot be empty: {}",
                s
            )));
        }

        Ok(Self {
            project_id: parts[1].to_string(),
        })
    }

    /// The project this channel is scoped to.
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }
}

impl std::fmt::Display for ProjectChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "project:{}", self.project_id)
    }
}
