//! # Atelier Realtime
//!
//! Publish-subscribe channel transport for the Atelier collaboration platform.
//!
//! Every project has one channel (`project:<id>`) carrying two classes of
//! traffic: ephemeral presence tracking (who is attached, with what cursor and
//! selection) and fire-and-forget broadcasts between attached sessions.
//!
//! ## Features
//!
//! - **Transport contract**: [`ChannelTransport`] with subscribe / track /
//!   send / unsubscribe, implemented by any realtime backend
//! - **In-process broker**: [`ChannelBroker`] for tests and colocated sessions
//! - **Wire messages**: the `{type, payload}` broadcast shape with typed
//!   payloads for presence actions and version restores
//!
//! ## Wire format
//!
//! ```json
//! // Presence update
//! {"type": "user_presence", "payload": {"action": "cursor", "user_id": "u1",
//!  "cursor": {"line": 3, "column": 14}}, "timestamp": 1712345678901}
//!
//! // Version restore notification
//! {"type": "version_restore", "payload": {"version_id": "v1",
//!  "content": "<main/>", "kind": "markup"}, "timestamp": 1712345678901}
//! ```
//!
//! Unknown `type` tags deserialize to [`MessageKind::Unknown`] and are
//! ignored by receivers, keeping the channel forward-compatible.
//!
//! ## Example
//!
//! ```rust
//! use atelier_realtime::{ChannelBroker, ChannelTransport, ProjectChannel};
//! use atelier_types::UserPresence;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> atelier_realtime::Result<()> {
//! let broker = ChannelBroker::new();
//! let channel = ProjectChannel::new("p-1");
//!
//! let subscription = broker.subscribe(&channel).await?;
//! broker
//!     .track(
//!         &subscription.handle,
//!         UserPresence::new("u1", "alice@example.com"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod channel;
pub mod error;
pub mod event;
pub mod message;
pub mod transport;

pub use broker::{BrokerStats, ChannelBroker, MAX_SUBSCRIBERS_PER_CHANNEL};
pub use channel::ProjectChannel;
pub use error::TransportError;
pub use event::ChannelEvent;
pub use message::{BroadcastMessage, MessageKind, PresencePayload, RestorePayload};
pub use transport::{ChannelTransport, Subscription, SubscriptionHandle};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
