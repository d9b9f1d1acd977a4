use std::sync::Arc;

use tracing::warn;

use campus_auth::Role;
use campus_session::{Profile, SessionManager, SessionState};

use crate::error::SecurityError;

/// Answers "is the current session allowed to see this?".
///
/// Every check reads fresh from the session manager; given the same stored
/// state and clock the answers are deterministic and side-effect-free.
#[derive(Clone)]
pub struct AccessEvaluator {
    manager: Arc<SessionManager>,
}

impl AccessEvaluator {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.manager.check_session(), SessionState::Authenticated(_))
    }

    pub fn current_profile(&self) -> Option<Profile> {
        match self.manager.check_session() {
            SessionState::Authenticated(session) => Some(session.profile),
            _ => None,
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        self.current_profile().map(|profile| profile.role)
    }

    /// False when not authenticated, or when `required` does not name the
    /// session's role.
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        match self.current_role() {
            Some(role) => required.contains(&role),
            None => false,
        }
    }

    pub fn ensure_any_role(&self, required: &[Role]) -> Result<(), SecurityError> {
        let Some(role) = self.current_role() else {
            return Err(SecurityError::Unauthenticated);
        };
        if required.contains(&role) {
            return Ok(());
        }
        warn!(%role, ?required, "role_check_failed");
        Err(SecurityError::Forbidden)
    }

    /// `Authorization` header for backend calls, when the backend issued a
    /// credential at login. The local token is never used here.
    pub fn authorization_header(&self) -> Option<(&'static str, String)> {
        let session = self.manager.store().load()?;
        let token = session.api_token?;
        Some(("Authorization", format!("Bearer {token}")))
    }
}
