//! End-to-end collaboration tests.
//!
//! Two sessions share one in-process broker and collaborate on a project:
//! presence propagates between them, saves land in durable history, restores
//! notify the other side, and teardown leaves no ghost routing behind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::time::timeout;

use atelier_collab::{
    CollabSession, CollabError, PresencePatch, SessionNotice, SessionState, StaticAuth,
};
use atelier_history::VersionStore;
use atelier_presence::PresenceSnapshot;
use atelier_realtime::{
    BroadcastMessage, ChannelBroker, ChannelTransport, ProjectChannel, Subscription,
    SubscriptionHandle, TransportError, MAX_SUBSCRIBERS_PER_CHANNEL,
};
use atelier_types::{ContentKind, CursorPosition, UserIdentity, UserPresence};

const WAIT: Duration = Duration::from_secs(2);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct Fixture {
    broker: Arc<ChannelBroker>,
    store: Arc<VersionStore>,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        Self {
            broker: Arc::new(ChannelBroker::new()),
            store: Arc::new(VersionStore::in_memory()),
        }
    }

    fn session(&self, project: &str, user: &str) -> Arc<CollabSession> {
        let identity = UserIdentity::new(user, format!("{user}@example.com"));
        Arc::new(CollabSession::new(
            project,
            self.broker.clone(),
            self.store.clone(),
            Arc::new(StaticAuth::new(identity)),
        ))
    }
}

/// Waits until the observed presence snapshot satisfies the predicate.
async fn wait_for_presence(
    rx: &mut watch::Receiver<PresenceSnapshot>,
    predicate: impl Fn(&PresenceSnapshot) -> bool,
) {
    timeout(WAIT, async {
        loop {
            if predicate(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.expect("presence channel closed");
        }
    })
    .await
    .expect("timed out waiting for presence change");
}

#[tokio::test]
async fn test_presence_propagates_between_sessions() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    let mut alice_rx = alice.presence();
    let mut bob_rx = bob.presence();

    wait_for_presence(&mut alice_rx, |s| s.users.len() == 2).await;
    wait_for_presence(&mut bob_rx, |s| s.users.len() == 2).await;

    let snapshot = bob.presence_snapshot();
    assert!(snapshot.users.contains_key("alice"));
    assert!(snapshot.users.contains_key("bob"));
}

#[tokio::test]
async fn test_cursor_update_propagates() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    let mut alice_rx = alice.presence();
    let mut bob_rx = bob.presence();
    wait_for_presence(&mut alice_rx, |s| s.users.len() == 2).await;
    wait_for_presence(&mut bob_rx, |s| s.users.len() == 2).await;

    alice
        .update_presence(PresencePatch::cursor(CursorPosition::new(3, 14)))
        .await;

    wait_for_presence(&mut bob_rx, |s| {
        s.users
            .get("alice")
            .is_some_and(|u| u.cursor == Some(CursorPosition::new(3, 14)))
    })
    .await;
}

#[tokio::test]
async fn test_leave_removes_presence() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    let mut alice_rx = alice.presence();
    wait_for_presence(&mut alice_rx, |s| s.users.len() == 2).await;

    bob.leave().await;
    wait_for_presence(&mut alice_rx, |s| {
        s.users.len() == 1 && !s.users.contains_key("bob")
    })
    .await;
}

#[tokio::test]
async fn test_no_ghost_updates_after_leave() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    let mut alice_rx = alice.presence();
    let mut bob_rx = bob.presence();
    wait_for_presence(&mut alice_rx, |s| s.users.len() == 2).await;
    wait_for_presence(&mut bob_rx, |s| s.users.len() == 2).await;

    bob.leave().await;
    wait_for_presence(&mut alice_rx, |s| s.users.len() == 1).await;

    alice
        .update_presence(PresencePatch::cursor(CursorPosition::new(9, 9)))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Bob's tracker stopped the moment the session left.
    let stale = bob.presence_snapshot();
    assert!(stale.users.get("alice").is_some_and(|u| u.cursor.is_none()));
}

#[tokio::test]
async fn test_restore_notifies_other_session() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();
    let mut notices = bob.notices();

    let entry = alice
        .save_version("<main>v1</main>", ContentKind::Markup)
        .await
        .unwrap();
    alice.restore_version(&entry.id).await.unwrap();

    let notice = timeout(WAIT, notices.recv())
        .await
        .expect("timed out waiting for restore notice")
        .unwrap();
    assert_eq!(
        notice,
        SessionNotice::VersionRestored {
            version_id: entry.id.clone(),
            kind: ContentKind::Markup,
            content: "<main>v1</main>".to_string(),
        }
    );

    // The live content was persisted before the broadcast went out.
    assert_eq!(
        fixture
            .store
            .content("p-1", ContentKind::Markup)
            .await
            .unwrap(),
        Some("<main>v1</main>".to_string())
    );
}

#[tokio::test]
async fn test_history_loaded_on_attach() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    alice.attach().await.unwrap();
    alice.save_version("v1", ContentKind::Markup).await.unwrap();
    alice.save_version("v2", ContentKind::Markup).await.unwrap();

    let carol = fixture.session("p-1", "carol");
    carol.attach().await.unwrap();

    let history = carol.history().borrow().clone();
    let contents: Vec<&str> = history.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["v2", "v1"]);
}

#[tokio::test]
async fn test_concurrent_saves_both_land_in_history() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-1", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    alice.save_version("va", ContentKind::Markup).await.unwrap();
    bob.save_version("vb", ContentKind::Markup).await.unwrap();

    let history = fixture.store.history("p-1").await.unwrap();
    assert_eq!(history.len(), 2);
    let authors: Vec<&str> = history.iter().map(|e| e.author_id.as_str()).collect();
    assert!(authors.contains(&"alice"));
    assert!(authors.contains(&"bob"));
}

#[tokio::test]
async fn test_sessions_on_different_projects_are_independent() {
    let fixture = Fixture::new();
    let alice = fixture.session("p-1", "alice");
    let bob = fixture.session("p-2", "bob");

    alice.attach().await.unwrap();
    bob.attach().await.unwrap();

    let mut alice_rx = alice.presence();
    wait_for_presence(&mut alice_rx, |s| s.users.len() == 1).await;
    assert!(!alice.presence_snapshot().users.contains_key("bob"));
}

/// Transport that blocks subscribe acknowledgments until released.
struct GatedTransport {
    inner: ChannelBroker,
    gate: Notify,
}

#[async_trait]
impl ChannelTransport for GatedTransport {
    async fn subscribe(&self, channel: &ProjectChannel) -> atelier_realtime::Result<Subscription> {
        self.gate.notified().await;
        self.inner.subscribe(channel).await
    }

    async fn track(
        &self,
        handle: &SubscriptionHandle,
        presence: UserPresence,
    ) -> atelier_realtime::Result<()> {
        self.inner.track(handle, presence).await
    }

    async fn send(
        &self,
        handle: &SubscriptionHandle,
        message: BroadcastMessage,
    ) -> atelier_realtime::Result<()> {
        self.inner.send(handle, message).await
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> atelier_realtime::Result<()> {
        self.inner.unsubscribe(handle).await
    }
}

#[tokio::test]
async fn test_stale_attach_guard() {
    init_tracing();
    let transport = Arc::new(GatedTransport {
        inner: ChannelBroker::new(),
        gate: Notify::new(),
    });
    let session = Arc::new(CollabSession::new(
        "p-1",
        transport.clone(),
        Arc::new(VersionStore::in_memory()),
        Arc::new(StaticAuth::new(UserIdentity::new(
            "alice",
            "alice@example.com",
        ))),
    ));

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.attach().await }
    });

    // Let the attach reach the transport and park on the gate.
    timeout(WAIT, async {
        while session.state() != SessionState::Attaching {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("attach never started");

    session.leave().await;
    transport.gate.notify_one();

    let state = pending.await.unwrap().unwrap();
    assert_eq!(state, SessionState::Closed);
    assert_eq!(session.state(), SessionState::Closed);

    // The late acknowledgment was released, not resurrected.
    assert_eq!(
        transport.inner.subscriber_count(&ProjectChannel::new("p-1")),
        0
    );
}

/// Transport whose subscribe always fails.
struct FailingTransport;

#[async_trait]
impl ChannelTransport for FailingTransport {
    async fn subscribe(&self, _channel: &ProjectChannel) -> atelier_realtime::Result<Subscription> {
        Err(TransportError::SubscriberLimit(MAX_SUBSCRIBERS_PER_CHANNEL))
    }

    async fn track(
        &self,
        handle: &SubscriptionHandle,
        _presence: UserPresence,
    ) -> atelier_realtime::Result<()> {
        Err(TransportError::UnknownSubscription(handle.id().to_string()))
    }

    async fn send(
        &self,
        handle: &SubscriptionHandle,
        _message: BroadcastMessage,
    ) -> atelier_realtime::Result<()> {
        Err(TransportError::UnknownSubscription(handle.id().to_string()))
    }

    async fn unsubscribe(&self, _handle: &SubscriptionHandle) -> atelier_realtime::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_attach_failure_reverts_to_detached() {
    init_tracing();
    let session = CollabSession::new(
        "p-1",
        Arc::new(FailingTransport),
        Arc::new(VersionStore::in_memory()),
        Arc::new(StaticAuth::new(UserIdentity::new(
            "alice",
            "alice@example.com",
        ))),
    );

    let result = session.attach().await;
    assert!(matches!(result, Err(CollabError::Transport(_))));
    assert_eq!(session.state(), SessionState::Detached);

    // A fresh attach may be issued after the failure.
    let retry = session.attach().await;
    assert!(matches!(retry, Err(CollabError::Transport(_))));
    assert_eq!(session.state(), SessionState::Detached);
}
