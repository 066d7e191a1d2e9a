//! In-process channel broker.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use atelier_types::UserPresence;

use crate::channel::ProjectChannel;
use crate::error::TransportError;
use crate::event::ChannelEvent;
use crate::message::BroadcastMessage;
use crate::transport::{ChannelTransport, Subscription, SubscriptionHandle};
use crate::Result;

/// Maximum subscribers per project channel.
pub const MAX_SUBSCRIBERS_PER_CHANNEL: usize = 256;

/// One subscriber registered on a channel.
#[derive(Debug)]
struct Subscriber {
    sender: mpsc::UnboundedSender<ChannelEvent>,
    presence: Option<UserPresence>,
}

/// Per-channel registry of subscribers and their tracked presence.
#[derive(Debug, Default)]
struct ChannelState {
    subscribers: HashMap<String, Subscriber>,
}

impl ChannelState {
    /// Full presence map over all subscribers that have tracked state.
    fn presence_state(&self) -> HashMap<String, UserPresence> {
        self.subscribers
            .values()
            .filter_map(|s| s.presence.clone())
            .map(|p| (p.user_id.clone(), p))
            .collect()
    }
}

/// In-process implementation of [`ChannelTransport`].
///
/// Manages per-project channels, delivers a full presence sync to each new
/// subscriber, emits join/leave events around track/unsubscribe, and fans out
/// broadcasts to every subscriber except the sender.
#[derive(Debug, Default)]
pub struct ChannelBroker {
    channels: RwLock<HashMap<ProjectChannel, ChannelState>>,
    stats: RwLock<BrokerStats>,
}

impl ChannelBroker {
    /// Creates a new broker with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers on a channel.
    pub fn subscriber_count(&self, channel: &ProjectChannel) -> usize {
        self.channels
            .read()
            .get(channel)
            .map_or(0, |state| state.subscribers.len())
    }

    /// Broker statistics.
    pub fn stats(&self) -> BrokerStats {
        let mut stats = self.stats.read().clone();
        stats.current_subscriptions = self
            .channels
            .read()
            .values()
            .map(|state| state.subscribers.len())
            .sum();
        stats
    }

    /// Fans an event out to all subscribers of a channel, optionally skipping
    /// one subscription id. Closed receivers are skipped.
    fn fan_out(state: &ChannelState, event: &ChannelEvent, skip: Option<&str>) -> usize {
        let mut recipients = 0;
        for (id, subscriber) in &state.subscribers {
            if skip == Some(id.as_str()) {
                continue;
            }
            if subscriber.sender.send(event.clone()).is_ok() {
                recipients += 1;
            }
        }
        recipients
    }
}

#[async_trait]
impl ChannelTransport for ChannelBroker {
    async fn subscribe(&self, channel: &ProjectChannel) -> Result<Subscription> {
        let mut channels = self.channels.write();
        let state = channels.entry(channel.clone()).or_default();

        if state.subscribers.len() >= MAX_SUBSCRIBERS_PER_CHANNEL {
            return Err(TransportError::SubscriberLimit(MAX_SUBSCRIBERS_PER_CHANNEL));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let (sender, events) = mpsc::unbounded_channel();

        // Initial sync delivers the channel's current presence state.
        let _ = sender.send(ChannelEvent::PresenceSync(state.presence_state()));

        state.subscribers.insert(
            id.clone(),
            Subscriber {
                sender,
                presence: None,
            },
        );
        self.stats.write().total_subscriptions += 1;

        info!(channel = %channel, subscription = %id, "Subscribed");

        Ok(Subscription {
            handle: SubscriptionHandle::new(id, channel.clone()),
            events,
        })
    }

    async fn track(&self, handle: &SubscriptionHandle, presence: UserPresence) -> Result<()> {
        let mut channels = self.channels.write();
        let state = channels
            .get_mut(handle.channel())
            .ok_or_else(|| TransportError::UnknownSubscription(handle.id().to_string()))?;

        let subscriber = state
            .subscribers
            .get_mut(handle.id())
            .ok_or_else(|| TransportError::UnknownSubscription(handle.id().to_string()))?;
        subscriber.presence = Some(presence.clone());

        let event = ChannelEvent::PresenceJoin {
            user_id: presence.user_id.clone(),
            presence,
        };
        let recipients = Self::fan_out(state, &event, None);
        self.stats.write().total_events += 1;

        debug!(
            channel = %handle.channel(),
            subscription = %handle.id(),
            recipients,
            "Presence tracked"
        );
        Ok(())
    }

    async fn send(&self, handle: &SubscriptionHandle, message: BroadcastMessage) -> Result<()> {
        let channels = self.channels.read();
        let state = channels
            .get(handle.channel())
            .ok_or_else(|| TransportError::UnknownSubscription(handle.id().to_string()))?;

        if !state.subscribers.contains_key(handle.id()) {
            return Err(TransportError::UnknownSubscription(handle.id().to_string()));
        }

        let kind = message.kind;
        let event = ChannelEvent::Broadcast(message);
        let recipients = Self::fan_out(state, &event, Some(handle.id()));
        drop(channels);

        self.stats.write().total_events += 1;

        debug!(
            channel = %handle.channel(),
            message = %kind,
            recipients,
            "Broadcast sent"
        );
        Ok(())
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let mut channels = self.channels.write();
        let Some(state) = channels.get_mut(handle.channel()) else {
            return Ok(());
        };

        let Some(subscriber) = state.subscribers.remove(handle.id()) else {
            return Ok(());
        };

        if let Some(presence) = subscriber.presence {
            let event = ChannelEvent::PresenceLeave {
                user_id: presence.user_id,
            };
            Self::fan_out(state, &event, None);
            self.stats.write().total_events += 1;
        }

        // Drop the channel once its last subscriber leaves.
        if state.subscribers.is_empty() {
            channels.remove(handle.channel());
        }

        info!(channel = %handle.channel(), subscription = %handle.id(), "Unsubscribed");
        Ok(())
    }
}

/// Broker statistics.
#[derive(Debug, Clone, Default)]
pub struct BrokerStats {
    /// Current number of live subscriptions across all channels.
    pub current_subscriptions: usize,
    /// Total subscriptions since start.
    pub total_subscriptions: u64,
    /// Total presence and broadcast events fanned out since start.
    pub total_events: u64,
}
