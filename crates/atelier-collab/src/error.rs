//! Error types for collaboration sessions.

use thiserror::Error;

use atelier_history::HistoryError;
use atelier_realtime::TransportError;

use crate::session::SessionState;

/// Errors that can occur on a collaboration session.
#[derive(Debug, Error)]
pub enum CollabError {
    /// Channel transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Version history failure (persistence or unknown version).
    #[error(transparent)]
    History(#[from] HistoryError),

    /// No authenticated user is available to attach with.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Operation invoked outside its valid session state.
    #[error("invalid session state: cannot {operation} while {state}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The session state at the time.
        state: SessionState,
    },
}
