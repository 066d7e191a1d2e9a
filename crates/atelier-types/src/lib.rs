//! Shared types for the Atelier collaboration platform.
//!
//! This crate defines the identifiers and data-model types used across the
//! realtime, presence, history, and session crates.

mod content;
mod id;
mod identity;
mod presence;
mod time;

pub use content::ContentKind;
pub use id::{ProjectId, UserId, VersionId};
pub use identity::UserIdentity;
pub use presence::{CursorPosition, SelectionRange, UserPresence};
pub use time::now_ms;
