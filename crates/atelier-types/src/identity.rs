//! User identity supplied by the authentication layer.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// The authenticated local user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable account identifier.
    pub user_id: UserId,
    /// Display label shown to collaborators (typically the email address).
    pub label: String,
}

impl UserIdentity {
    /// Creates a new identity.
    pub fn new(user_id: impl Into<UserId>, label: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            label: label.into(),
        }
    }
}
