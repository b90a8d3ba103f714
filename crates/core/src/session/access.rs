use tracing::{info, warn};

use crate::error::{InventoryError, InventoryResult};

/// Whether admin controls are unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessState {
    #[default]
    Unauthenticated,
    Authenticated,
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted,
    Denied,
}

impl LoginOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            LoginOutcome::Granted => "Admin access granted.",
            LoginOutcome::Denied => "Incorrect password.",
        }
    }
}

/// Admin gate guarding add, update and remove.
///
/// There is no logout; an admin session lasts until the process exits or a
/// later login attempt fails.
#[derive(Debug, Clone)]
pub struct AdminSession {
    secret: String,
    state: AccessState,
}

impl AdminSession {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            state: AccessState::Unauthenticated,
        }
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AccessState::Authenticated
    }

    /// Compare `password` with the configured secret. A wrong password also
    /// revokes a previously granted session.
    pub fn login(&mut self, password: &str) -> LoginOutcome {
        if password == self.secret {
            self.state = AccessState::Authenticated;
            info!("Admin login granted");
            LoginOutcome::Granted
        } else {
            self.state = AccessState::Unauthenticated;
            warn!("Admin login denied");
            LoginOutcome::Denied
        }
    }

    /// Gate for admin-only operations.
    pub fn require_admin(&self) -> InventoryResult<()> {
        match self.state {
            AccessState::Authenticated => Ok(()),
            AccessState::Unauthenticated => Err(InventoryError::AccessDenied),
        }
    }
}
