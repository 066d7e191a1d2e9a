//! # Atelier Presence
//!
//! Eventually-consistent presence tracking for Atelier project sessions.
//!
//! The state itself is a pure reducer over [`PresenceSnapshot`]
//! (`(snapshot, update) -> changed`), independently testable without a live
//! transport. [`PresenceTracker`] wraps the reducer with a `tokio::watch`
//! channel so consumers observe every change to the aggregate map.
//!
//! Semantics:
//!
//! - a full sync is authoritative and replaces all prior state
//! - join inserts or overwrites, leave removes (absent users are a no-op)
//! - cursor and selection updates only mutate existing entries; updates for
//!   unknown users are dropped rather than synthesizing partial records
//! - no operation fails: one malformed or stale update must never prevent
//!   delivery of the next

mod state;
mod tracker;

pub use state::{PresenceSnapshot, PresenceUpdate};
pub use tracker::PresenceTracker;
