//! Presence tracker with change notification.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;

use atelier_types::{now_ms, CursorPosition, SelectionRange, UserId, UserPresence};

use crate::state::{PresenceSnapshot, PresenceUpdate};

/// Tracks the live set of users attached to one project.
///
/// Owns the project's [`PresenceSnapshot`] and publishes it through a watch
/// channel whenever it changes. One tracker exists per collaboration session;
/// it is only ever mutated from that session's dispatch loop.
#[derive(Debug)]
pub struct PresenceTracker {
    tx: watch::Sender<PresenceSnapshot>,
}

impl PresenceTracker {
    /// Creates a tracker with an empty snapshot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PresenceSnapshot::default());
        Self { tx }
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PresenceSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> PresenceSnapshot {
        self.tx.borrow().clone()
    }

    /// Replaces the entire presence map with a full state.
    ///
    /// The authoritative resync path: wins over any incremental update
    /// received before it, regardless of arrival order.
    pub fn sync(&self, users: HashMap<UserId, UserPresence>) {
        self.apply(PresenceUpdate::Sync(users));
    }

    /// Inserts or overwrites the entry for a user.
    pub fn apply_join(&self, user_id: UserId, presence: UserPresence) {
        self.apply(PresenceUpdate::Join { user_id, presence });
    }

    /// Removes the entry for a user; absent users are a no-op.
    pub fn apply_leave(&self, user_id: UserId) {
        self.apply(PresenceUpdate::Leave { user_id });
    }

    /// Updates the cursor of an existing entry; unknown users are dropped.
    pub fn apply_cursor_update(&self, user_id: UserId, cursor: CursorPosition) {
        self.apply(PresenceUpdate::Cursor { user_id, cursor });
    }

    /// Updates the selection of an existing entry; unknown users are dropped.
    pub fn apply_selection_update(&self, user_id: UserId, selection: SelectionRange) {
        self.apply(PresenceUpdate::Selection { user_id, selection });
    }

    fn apply(&self, update: PresenceUpdate) {
        let now = now_ms();
        let applied = self
            .tx
            .send_if_modified(|snapshot| snapshot.apply(update, now));
        if !applied {
            debug!("Dropped presence update with no effect");
        }
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
