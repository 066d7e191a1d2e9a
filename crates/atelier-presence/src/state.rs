//! Presence snapshot and its reducer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use atelier_types::{CursorPosition, SelectionRange, UserId, UserPresence};

/// An update to a project's presence state.
///
/// Incremental updates are applied in arrival order; a sync is authoritative
/// and replaces everything applied before it.
#[derive(Debug, Clone)]
pub enum PresenceUpdate {
    /// Full presence state from a resynchronization.
    Sync(HashMap<UserId, UserPresence>),
    /// A user joined (or re-announced themselves).
    Join {
        /// Identifier of the joining user.
        user_id: UserId,
        /// Full presence record.
        presence: UserPresence,
    },
    /// A user left.
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

/// Aggregate view of all users attached to one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    /// Presence record per attached user.
    pub users: HashMap<UserId, UserPresence>,
    /// Epoch milliseconds of the last applied update.
    pub last_update_ms: u64,
}

impl PresenceSnapshot {
    /// Applies one update, returning whether the snapshot changed.
    ///
    /// `now_ms` stamps `last_update_ms` when a change is applied, keeping the
    /// reducer itself free of clock access.
    ///
    /// Cursor and selection updates for users without an existing entry are
    /// dropped: such an update implies a join that raced or was missed, and a
    /// partial record must not be synthesized from it.
    pub fn apply(&mut self, update: PresenceUpdate, now_ms: u64) -> bool {
        let changed = match update {
            PresenceUpdate::Sync(users) => {
                self.users = users;
                true
            }
            PresenceUpdate::Join { user_id, presence } => {
                self.users.insert(user_id, presence);
                true
            }
            PresenceUpdate::Leave { user_id } => self.users.remove(&user_id).is_some(),
            PresenceUpdate::Cursor { user_id, cursor } => match self.users.get_mut(&user_id) {
                Some(user) => {
                    user.cursor = Some(cursor);
                    true
                }
                None => false,
            },
            PresenceUpdate::Selection { user_id, selection } => {
                match self.users.get_mut(&user_id) {
                    Some(user) => {
                        user.selection = Some(selection);
                        true
                    }
                    None => false,
                }
            }
        };

        if changed {
            self.last_update_ms = now_ms;
        }
        changed
    }
}
