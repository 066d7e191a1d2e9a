//! Inbound events delivered on a channel subscription.

use std::collections::HashMap;

use atelier_types::{UserId, UserPresence};

use crate::message::BroadcastMessage;

/// An event delivered to one subscriber of a project channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Authoritative full presence state; replaces everything received before.
    PresenceSync(HashMap<UserId, UserPresence>),
    /// A user announced their presence on the channel.
    PresenceJoin {
        /// Identifier of the joining user.
        user_id: UserId,
        /// Full presence record at join time.
        presence: UserPresence,
    },
    /// A user's subscription was torn down.
    PresenceLeave {
        /// Identifier of the leaving user.
        user_id: UserId,
    },
    /// An ephemeral broadcast from another subscriber.
    Broadcast(BroadcastMessage),
}
