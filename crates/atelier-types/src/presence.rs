//! Presence data model: one user's live cursor and selection state.

use serde::{Deserialize, Serialize};

use crate::{UserId, UserIdentity};

/// Cursor position within the edited document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based column.
    pub column: u32,
}

impl CursorPosition {
    /// Creates a cursor position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Selected range as start/end offsets into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    /// Start offset (inclusive).
    pub start: u32,
    /// End offset (exclusive).
    pub end: u32,
}

impl SelectionRange {
    /// Creates a selection range.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// One user attached to a project's live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresence {
    /// Stable account identifier.
    pub user_id: UserId,
    /// Display label shown next to the cursor.
    pub label: String,
    /// Last known cursor position, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    /// Last known selection, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionRange>,
}

impl UserPresence {
    /// Creates a presence record with no cursor or selection yet.
    pub fn new(user_id: impl Into<UserId>, label: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            label: label.into(),
            cursor: None,
            selection: None,
        }
    }

    /// Sets the cursor position.
    pub fn with_cursor(mut self, cursor: CursorPosition) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the selection range.
    pub fn with_selection(mut self, selection: SelectionRange) -> Self {
        self.selection = Some(selection);
        self
    }
}

impl From<UserIdentity> for UserPresence {
    fn from(identity: UserIdentity) -> Self {
        Self::new(identity.user_id, identity.label)
    }
}
