//! # Atelier Collab
//!
//! Per-project collaboration sessions for the Atelier platform.
//!
//! A [`CollabSession`] binds one local client to one project's realtime
//! channel: it owns the channel subscription, feeds inbound presence events
//! into a per-session tracker, keeps a reactive view of the version history,
//! and broadcasts local changes (cursor moves, selection changes, restores)
//! to other attached sessions.
//!
//! Sessions are explicitly constructed and independently torn down, so one
//! process can hold sessions on several projects at once and tests get
//! deterministic teardown.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use atelier_collab::{CollabSession, StaticAuth};
//! use atelier_history::VersionStore;
//! use atelier_realtime::ChannelBroker;
//! use atelier_types::{ContentKind, UserIdentity};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> atelier_collab::Result<()> {
//! let transport = Arc::new(ChannelBroker::new());
//! let store = Arc::new(VersionStore::in_memory());
//! let auth = Arc::new(StaticAuth::new(UserIdentity::new(
//!     "u1",
//!     "alice@example.com",
//! )));
//!
//! let session = CollabSession::new("p-1", transport, store, auth);
//! session.attach().await?;
//! session.save_version("<main/>", ContentKind::Markup).await?;
//! session.leave().await;
//! # Ok(())
//! # }
//! ```

mod auth;
mod dispatch;
mod error;
mod session;

pub use auth::{AuthContext, StaticAuth};
pub use dispatch::SessionNotice;
pub use error::CollabError;
pub use session::{CollabSession, PresencePatch, SessionState};

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, CollabError>;
