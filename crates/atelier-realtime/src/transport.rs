//! Channel transport contract.

use async_trait::async_trait;
use tokio::sync::mpsc;

use atelier_types::UserPresence;

use crate::channel::ProjectChannel;
use crate::event::ChannelEvent;
use crate::message::BroadcastMessage;
use crate::Result;

/// Identifies one live subscription on a transport.
///
/// Cloneable so a session can keep issuing track/send/unsubscribe calls while
/// the event receiver is owned by its dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: String,
    channel: ProjectChannel,
}

impl SubscriptionHandle {
    /// Creates a handle. Transports assign the identifier.
    pub fn new(id: impl Into<String>, channel: ProjectChannel) -> Self {
        Self {
            id: id.into(),
            channel,
        }
    }

    /// Transport-assigned subscription identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Channel this subscription is bound to.
    pub fn channel(&self) -> &ProjectChannel {
        &self.channel
    }
}

/// A live subscription: the handle plus the inbound event stream.
#[derive(Debug)]
pub struct Subscription {
    /// Handle for subsequent transport calls.
    pub handle: SubscriptionHandle,
    /// Inbound events, delivered in arrival order.
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
}

/// A publish-subscribe transport bound to project channels.
///
/// Supports ephemeral presence tracking and fire-and-forget broadcasts.
/// Implemented in-process by [`crate::ChannelBroker`]; a deployment backed by
/// a managed realtime service implements the same contract.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Opens a subscription to a project channel.
    ///
    /// The first event delivered is a full presence sync of the channel.
    async fn subscribe(&self, channel: &ProjectChannel) -> Result<Subscription>;

    /// Announces the local user's presence on an open subscription.
    async fn track(&self, handle: &SubscriptionHandle, presence: UserPresence) -> Result<()>;

    /// Broadcasts a message to all other subscribers of the channel.
    async fn send(&self, handle: &SubscriptionHandle, message: BroadcastMessage) -> Result<()>;

    /// Tears down a subscription, announcing a presence leave if the
    /// subscriber had tracked presence. Unknown handles are a no-op.
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()>;
}
