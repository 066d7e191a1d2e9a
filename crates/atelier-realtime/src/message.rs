//! Broadcast message wire types.

use serde::{Deserialize, Serialize};

use atelier_types::{now_ms, ContentKind, CursorPosition, SelectionRange, UserId, UserPresence, VersionId};

use crate::error::TransportError;

/// Message kind tag carried on the wire.
///
/// Tags this build does not understand deserialize to [`MessageKind::Unknown`]
/// rather than failing, keeping the channel forward-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MessageKind {
    /// Presence change for one user.
    UserPresence,
    /// A version was restored into the live project content.
    VersionRestore,
    /// Any kind this build does not understand; ignored by receivers.
    Unknown,
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "user_presence" => MessageKind::UserPresence,
            "version_restore" => MessageKind::VersionRestore,
            _ => MessageKind::Unknown,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::UserPresence => write!(f, "user_presence"),
            MessageKind::VersionRestore => write!(f, "version_restore"),
            MessageKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A fire-and-forget message broadcast to all other channel subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Message kind tag.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Kind-specific payload.
    pub payload: serde_json::Value,
    /// Producer-stamped epoch milliseconds; an ordering hint only, receivers
    /// must not rely on clock-synchronized ordering across clients.
    pub timestamp: u64,
}

impl BroadcastMessage {
    /// Creates a message with the current timestamp.
    pub fn new(kind: MessageKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            timestamp: now_ms(),
        }
    }

    /// Builds a `user_presence` message.
    pub fn presence(payload: &PresencePayload) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageKind::UserPresence,
            serde_json::to_value(payload)?,
        ))
    }

    /// Builds a `version_restore` message.
    pub fn restore(payload: &RestorePayload) -> Result<Self, TransportError> {
        Ok(Self::new(
            MessageKind::VersionRestore,
            serde_json::to_value(payload)?,
        ))
    }
}

/// Payload of a `user_presence` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PresencePayload {
    /// A user attached to the project.
    Join {
        /// Full presence record of the joining user.
        user: UserPresence,
    },
    /// A user detached from the project.
    Leave {
        /// Identifier of the leaving user.
        user_id: UserId,
    },
    /// A user moved their cursor.
    Cursor {
        /// Identifier of the user.
        user_id: UserId,
        /// New cursor position.
        cursor: CursorPosition,
    },
    /// A user changed their selection.
    Selection {
        /// Identifier of the user.
        user_id: UserId,
        /// New selection range.
        selection: SelectionRange,
    },
}

/// Payload of a `version_restore` message.
///
/// Carries the restored content so receivers can refresh their live view
/// without re-querying storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestorePayload {
    /// Identifier of the restored version entry.
    pub version_id: VersionId,
    /// Full content that was written back to the project.
    pub content: String,
    /// Which live content field was overwritten.
    pub kind: ContentKind,
}
