//! Error types for the channel transport.

use thiserror::Error;

/// Errors that can occur on the channel transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Invalid channel name.
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// Subscriber limit reached for a channel.
    #[error("subscriber limit reached: max {0} per channel")]
    SubscriberLimit(usize),

    /// Operation referenced a subscription the transport does not know.
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    /// Serialization error while building or decoding a message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
