//! Authenticated-user context.

use atelier_types::UserIdentity;

/// Supplies the identity of the current local user.
///
/// Implemented over whatever authentication layer hosts the session; a
/// session refuses to attach while no user is available.
pub trait AuthContext: Send + Sync {
    /// The currently authenticated user, if any.
    fn current_user(&self) -> Option<UserIdentity>;
}

/// An auth context with a fixed identity.
///
/// Covers tests and single-user tooling where the identity is known up front.
#[derive(Debug, Clone)]
pub struct StaticAuth {
    user: Option<UserIdentity>,
}

impl StaticAuth {
    /// Context that always reports the given user.
    pub fn new(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    /// Context with no authenticated user.
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl AuthContext for StaticAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}
