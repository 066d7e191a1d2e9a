//! Per-project collaboration sessions.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use atelier_history::{VersionEntry, VersionStore};
use atelier_presence::{PresenceSnapshot, PresenceTracker};
use atelier_realtime::{
    BroadcastMessage, ChannelEvent, ChannelTransport, PresencePayload, ProjectChannel,
    RestorePayload, SubscriptionHandle,
};
use atelier_types::{
    ContentKind, CursorPosition, ProjectId, SelectionRange, UserIdentity, UserPresence, VersionId,
};

use crate::auth::AuthContext;
use crate::dispatch::{dispatch_event, SessionNotice};
use crate::error::CollabError;
use crate::Result;

/// Capacity of the consumer notice stream.
const NOTICE_CAPACITY: usize = 64;

/// Lifecycle state of a collaboration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel subscription exists; `attach` may be called.
    Detached,
    /// Subscription requested, awaiting transport acknowledgment.
    Attaching,
    /// Subscribed, presence announced, inbound messages being dispatched.
    Attached,
    /// Terminal: the session was left and must not be reused.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Detached => write!(f, "detached"),
            SessionState::Attaching => write!(f, "attaching"),
            SessionState::Attached => write!(f, "attached"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Partial presence update for the local user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresencePatch {
    /// New cursor position, if it moved.
    pub cursor: Option<CursorPosition>,
    /// New selection range, if it changed.
    pub selection: Option<SelectionRange>,
}

impl PresencePatch {
    /// Patch carrying only a cursor move.
    pub fn cursor(cursor: CursorPosition) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::default()
        }
    }

    /// Patch carrying only a selection change.
    pub fn selection(selection: SelectionRange) -> Self {
        Self {
            selection: Some(selection),
            ..Self::default()
        }
    }
}

/// Mutable session core, guarded by a mutex that is never held across await.
#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    /// Bumped on every `leave`; a pending attach compares its starting epoch
    /// before applying a late acknowledgment.
    epoch: u64,
    local_user: Option<UserIdentity>,
    handle: Option<SubscriptionHandle>,
    dispatch: Option<JoinHandle<()>>,
}

/// The live binding between one local client and one project's channel.
///
/// Sessions are explicitly constructed per project and own their channel
/// subscription, presence tracker, and reactive history view. A session goes
/// through `Detached -> Attaching -> Attached` and ends `Closed`; once closed
/// it cannot be reused, so reattaching means constructing a fresh session.
pub struct CollabSession {
    project_id: ProjectId,
    channel: ProjectChannel,
    transport: Arc<dyn ChannelTransport>,
    store: Arc<VersionStore>,
    auth: Arc<dyn AuthContext>,
    tracker: Arc<PresenceTracker>,
    history_tx: watch::Sender<Vec<VersionEntry>>,
    notice_tx: broadcast::Sender<SessionNotice>,
    inner: Mutex<SessionInner>,
}

impl CollabSession {
    /// Creates a detached session for one project.
    pub fn new(
        project_id: impl Into<ProjectId>,
        transport: Arc<dyn ChannelTransport>,
        store: Arc<VersionStore>,
        auth: Arc<dyn AuthContext>,
    ) -> Self {
        let project_id = project_id.into();
        let (history_tx, _) = watch::channel(Vec::new());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            channel: ProjectChannel::new(project_id.clone()),
            project_id,
            transport,
            store,
            auth,
            tracker: Arc::new(PresenceTracker::new()),
            history_tx,
            notice_tx,
            inner: Mutex::new(SessionInner {
                state: SessionState::Detached,
                epoch: 0,
                local_user: None,
                handle: None,
                dispatch: None,
            }),
        }
    }

    /// Project this session is bound to.
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Read-only reactive presence map.
    pub fn presence(&self) -> watch::Receiver<PresenceSnapshot> {
        self.tracker.subscribe()
    }

    /// Current presence snapshot.
    pub fn presence_snapshot(&self) -> PresenceSnapshot {
        self.tracker.snapshot()
    }

    /// Read-only reactive version history, newest first.
    pub fn history(&self) -> watch::Receiver<Vec<VersionEntry>> {
        self.history_tx.subscribe()
    }

    /// Consumer notices (restores performed by other sessions).
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    /// Attaches the session to its project channel.
    ///
    /// Requires an authenticated user. Calling on an already attached session
    /// is a no-op returning the current state; a closed session cannot be
    /// reattached. On transport failure the session reverts to detached and
    /// the call may be retried.
    pub async fn attach(&self) -> Result<SessionState> {
        let user = self
            .auth
            .current_user()
            .ok_or(CollabError::NotAuthenticated)?;

        let epoch = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Attached => return Ok(SessionState::Attached),
                SessionState::Attaching => return Ok(SessionState::Attaching),
                SessionState::Closed => {
                    return Err(CollabError::InvalidState {
                        operation: "attach",
                        state: SessionState::Closed,
                    })
                }
                SessionState::Detached => {
                    inner.state = SessionState::Attaching;
                    inner.epoch
                }
            }
        };

        let subscription = match self.transport.subscribe(&self.channel).await {
            Ok(subscription) => subscription,
            Err(err) => {
                let mut inner = self.inner.lock();
                if inner.epoch == epoch && inner.state == SessionState::Attaching {
                    inner.state = SessionState::Detached;
                }
                return Err(err.into());
            }
        };

        let handle = subscription.handle.clone();
        let superseded = {
            let mut inner = self.inner.lock();
            if inner.epoch != epoch || inner.state != SessionState::Attaching {
                true
            } else {
                inner.handle = Some(handle.clone());
                inner.dispatch = Some(self.spawn_dispatch(subscription.events));
                inner.local_user = Some(user.clone());
                inner.state = SessionState::Attached;
                false
            }
        };

        // The acknowledgment arrived for a session that was left in the
        // meantime; release the subscription instead of resurrecting it.
        if superseded {
            if let Err(err) = self.transport.unsubscribe(&handle).await {
                warn!(project = %self.project_id, error = %err, "Failed to release superseded subscription");
            }
            info!(project = %self.project_id, "Attach superseded by leave");
            return Ok(self.state());
        }

        // Announce local presence. Best-effort: presence self-heals on the
        // next update or sync.
        if let Err(err) = self
            .transport
            .track(&handle, UserPresence::from(user))
            .await
        {
            warn!(project = %self.project_id, error = %err, "Failed to announce presence");
        }

        // Initial history load; the reactive view starts empty on failure and
        // a later `refresh_history` surfaces the error.
        match self.store.history(&self.project_id).await {
            Ok(history) => {
                let _ = self.history_tx.send(history);
            }
            Err(err) => {
                warn!(project = %self.project_id, error = %err, "Failed to load project history")
            }
        }

        info!(project = %self.project_id, "Session attached");
        Ok(SessionState::Attached)
    }

    /// Merges cursor/selection changes into the local presence and broadcasts
    /// them to other attached sessions.
    ///
    /// Valid only while attached; outside that state the update is dropped
    /// with a warning rather than an error, since this is driven by
    /// high-frequency editor events. Broadcast failures are likewise dropped:
    /// presence is best-effort and heals on the next update.
    pub async fn update_presence(&self, patch: PresencePatch) {
        let (handle, user_id) = {
            let inner = self.inner.lock();
            match (inner.state, &inner.handle, &inner.local_user) {
                (SessionState::Attached, Some(handle), Some(user)) => {
                    (handle.clone(), user.user_id.clone())
                }
                (state, ..) => {
                    warn!(project = %self.project_id, %state, "Ignored presence update outside attached session");
                    return;
                }
            }
        };

        if let Some(cursor) = patch.cursor {
            self.tracker.apply_cursor_update(user_id.clone(), cursor);
            self.broadcast_presence(
                &handle,
                &PresencePayload::Cursor {
                    user_id: user_id.clone(),
                    cursor,
                },
            )
            .await;
        }

        if let Some(selection) = patch.selection {
            self.tracker
                .apply_selection_update(user_id.clone(), selection);
            self.broadcast_presence(&handle, &PresencePayload::Selection { user_id, selection })
                .await;
        }
    }

    /// Commits a full content snapshot authored by the local user.
    ///
    /// The reactive history view is updated only after the write is durable.
    pub async fn save_version(
        &self,
        content: impl Into<String>,
        kind: ContentKind,
    ) -> Result<VersionEntry> {
        let user = self.require_attached("save a version")?.1;

        let entry = self
            .store
            .commit(
                self.project_id.clone(),
                user.user_id,
                user.label,
                content,
                kind,
            )
            .await?;

        self.history_tx
            .send_modify(|history| history.insert(0, entry.clone()));
        Ok(entry)
    }

    /// Restores a version into the project's live content and notifies other
    /// attached sessions.
    ///
    /// Persistence comes first; the broadcast is best-effort, so a restore
    /// whose notification fails is still a successful restore.
    pub async fn restore_version(&self, version_id: &VersionId) -> Result<VersionEntry> {
        let handle = self.require_attached("restore a version")?.0;

        let entry = self.store.restore(&self.project_id, version_id).await?;

        let payload = RestorePayload {
            version_id: entry.id.clone(),
            content: entry.content.clone(),
            kind: entry.kind,
        };
        match BroadcastMessage::restore(&payload) {
            Ok(message) => {
                if let Err(err) = self.transport.send(&handle, message).await {
                    warn!(project = %self.project_id, error = %err, "Restore broadcast failed");
                }
            }
            Err(err) => {
                warn!(project = %self.project_id, error = %err, "Failed to encode restore broadcast")
            }
        }

        Ok(entry)
    }

    /// Reloads the version history from storage into the reactive view.
    pub async fn refresh_history(&self) -> Result<Vec<VersionEntry>> {
        let history = self.store.history(&self.project_id).await?;
        let _ = self.history_tx.send(history.clone());
        Ok(history)
    }

    /// Ends the session and releases the channel subscription.
    ///
    /// Safe to call in any state, including while an attach is pending: the
    /// dispatch loop is torn down before this returns, so no further inbound
    /// message can reach the session's presence tracker. Repeated calls are
    /// no-ops.
    pub async fn leave(&self) {
        let (handle, dispatch) = {
            let mut inner = self.inner.lock();
            if inner.state == SessionState::Closed {
                return;
            }
            inner.state = SessionState::Closed;
            inner.epoch += 1;
            inner.local_user = None;
            (inner.handle.take(), inner.dispatch.take())
        };

        // Stop routing before releasing the subscription.
        if let Some(task) = dispatch {
            task.abort();
        }

        if let Some(handle) = handle {
            if let Err(err) = self.transport.unsubscribe(&handle).await {
                warn!(project = %self.project_id, error = %err, "Failed to unsubscribe");
            }
        }

        info!(project = %self.project_id, "Session left");
    }

    /// Handle and user for operations that require an attached session.
    fn require_attached(
        &self,
        operation: &'static str,
    ) -> Result<(SubscriptionHandle, UserIdentity)> {
        let inner = self.inner.lock();
        match (inner.state, &inner.handle, &inner.local_user) {
            (SessionState::Attached, Some(handle), Some(user)) => {
                Ok((handle.clone(), user.clone()))
            }
            (state, ..) => Err(CollabError::InvalidState { operation, state }),
        }
    }

    async fn broadcast_presence(&self, handle: &SubscriptionHandle, payload: &PresencePayload) {
        match BroadcastMessage::presence(payload) {
            Ok(message) => {
                if let Err(err) = self.transport.send(handle, message).await {
                    warn!(project = %self.project_id, error = %err, "Presence broadcast failed");
                }
            }
            Err(err) => {
                warn!(project = %self.project_id, error = %err, "Failed to encode presence broadcast")
            }
        }
    }

    fn spawn_dispatch(
        &self,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> JoinHandle<()> {
        let project_id = self.project_id.clone();
        let tracker = Arc::clone(&self.tracker);
        let notices = self.notice_tx.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                dispatch_event(&project_id, &tracker, &notices, event);
            }
            debug!(project = %project_id, "Dispatch loop ended");
        })
    }
}

impl std::fmt::Debug for CollabSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollabSession")
            .field("project_id", &self.project_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;
    use atelier_realtime::ChannelBroker;

    fn session_with_auth(auth: StaticAuth) -> CollabSession {
        CollabSession::new(
            "p-1",
            Arc::new(ChannelBroker::new()),
            Arc::new(VersionStore::in_memory()),
            Arc::new(auth),
        )
    }

    fn alice() -> UserIdentity {
        UserIdentity::new("alice", "alice@example.com")
    }

    #[tokio::test]
    async fn test_attach_requires_authenticated_user() {
        let session = session_with_auth(StaticAuth::anonymous());
        let result = session.attach().await;
        assert!(matches!(result, Err(CollabError::NotAuthenticated)));
        assert_eq!(session.state(), SessionState::Detached);
    }

    #[tokio::test]
    async fn test_attach_reaches_attached() {
        let session = session_with_auth(StaticAuth::new(alice()));
        assert_eq!(session.state(), SessionState::Detached);

        let state = session.attach().await.unwrap();
        assert_eq!(state, SessionState::Attached);
        assert_eq!(session.state(), SessionState::Attached);
    }

    #[tokio::test]
    async fn test_attach_is_idempotent_when_attached() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.attach().await.unwrap();
        let before = session.presence_snapshot();

        let state = session.attach().await.unwrap();
        assert_eq!(state, SessionState::Attached);
        assert_eq!(
            session.presence_snapshot().users.len(),
            before.users.len()
        );
    }

    #[tokio::test]
    async fn test_closed_session_cannot_reattach() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.attach().await.unwrap();
        session.leave().await;

        let result = session.attach().await;
        assert!(matches!(
            result,
            Err(CollabError::InvalidState {
                operation: "attach",
                state: SessionState::Closed,
            })
        ));
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.attach().await.unwrap();

        session.leave().await;
        session.leave().await;
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_leave_before_attach_closes_session() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.leave().await;
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_update_presence_outside_attached_is_noop() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session
            .update_presence(PresencePatch::cursor(CursorPosition::new(1, 1)))
            .await;
        assert!(session.presence_snapshot().users.is_empty());
    }

    #[tokio::test]
    async fn test_save_version_outside_attached_fails() {
        let session = session_with_auth(StaticAuth::new(alice()));
        let result = session.save_version("<main/>", ContentKind::Markup).await;
        assert!(matches!(
            result,
            Err(CollabError::InvalidState {
                state: SessionState::Detached,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_restore_unknown_version_fails() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.attach().await.unwrap();

        let result = session.restore_version(&"ghost".to_string()).await;
        assert!(matches!(
            result,
            Err(CollabError::History(
                atelier_history::HistoryError::VersionNotFound { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_save_version_updates_history_watch() {
        let session = session_with_auth(StaticAuth::new(alice()));
        session.attach().await.unwrap();
        let mut history = session.history();

        let entry = session
            .save_version("<main/>", ContentKind::Markup)
            .await
            .unwrap();

        assert!(history.has_changed().unwrap());
        let view = history.borrow_and_update();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, entry.id);
    }
}
