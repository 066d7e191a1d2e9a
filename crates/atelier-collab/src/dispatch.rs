//! Inbound channel event dispatch.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use atelier_presence::PresenceTracker;
use atelier_realtime::{ChannelEvent, MessageKind, PresencePayload, RestorePayload};
use atelier_types::{ContentKind, ProjectId, VersionId};

/// A notification surfaced to session consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// Another session restored a version; carries the restored content so
    /// the local view can refresh without re-querying storage.
    VersionRestored {
        /// Identifier of the restored version entry.
        version_id: VersionId,
        /// Which live content field was overwritten.
        kind: ContentKind,
        /// The restored content.
        content: String,
    },
}

/// Routes one inbound event to the presence tracker or the notice stream.
///
/// Classification is by message kind; unknown kinds are reserved for future
/// extension and ignored. Malformed payloads are dropped with a warning: no
/// inbound message may prevent delivery of the ones behind it, so nothing on
/// this path returns an error or panics.
pub(crate) fn dispatch_event(
    project_id: &ProjectId,
    tracker: &PresenceTracker,
    notices: &broadcast::Sender<SessionNotice>,
    event: ChannelEvent,
) {
    match event {
        ChannelEvent::PresenceSync(users) => tracker.sync(users),
        ChannelEvent::PresenceJoin { user_id, presence } => tracker.apply_join(user_id, presence),
        ChannelEvent::PresenceLeave { user_id } => tracker.apply_leave(user_id),
        ChannelEvent::Broadcast(message) => match message.kind {
            MessageKind::UserPresence => {
                match serde_json::from_value::<PresencePayload>(message.payload) {
                    Ok(PresencePayload::Join { user }) => {
                        tracker.apply_join(user.user_id.clone(), user)
                    }
                    Ok(PresencePayload::Leave { user_id }) => tracker.apply_leave(user_id),
                    Ok(PresencePayload::Cursor { user_id, cursor }) => {
                        tracker.apply_cursor_update(user_id, cursor)
                    }
                    Ok(PresencePayload::Selection { user_id, selection }) => {
                        tracker.apply_selection_update(user_id, selection)
                    }
                    Err(err) => {
                        warn!(project = %project_id, error = %err, "Dropped malformed presence payload")
                    }
                }
            }
            MessageKind::VersionRestore => {
                match serde_json::from_value::<RestorePayload>(message.payload) {
                    Ok(payload) => {
                        let _ = notices.send(SessionNotice::VersionRestored {
                            version_id: payload.version_id,
                            kind: payload.kind,
                            content: payload.content,
                        });
                    }
                    Err(err) => {
                        warn!(project = %project_id, error = %err, "Dropped malformed restore payload")
                    }
                }
            }
            MessageKind::Unknown => {
                debug!(project = %project_id, "Ignored broadcast of unknown kind")
            }
        },
    }
}
