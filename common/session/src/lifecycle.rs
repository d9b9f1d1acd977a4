use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use campus_auth::{codec, Claims, Role, TokenLifetime};

use crate::backend::{AuthBackend, LoginRequest};
use crate::error::{BackendError, SessionError, SessionResult};
use crate::record::{Profile, SessionRecord};
use crate::store::SessionStore;

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(ActiveSession),
    /// A token is present but past its expiry. Denied everywhere, though a
    /// stored refresh token may still revive the session.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub claims: Claims,
    pub profile: Profile,
}

/// Tunables for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_lifetime: TokenLifetime,
    /// Seconds before expiry at which `needs_refresh` starts reporting true.
    pub refresh_window_seconds: i64,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            default_lifetime: TokenLifetime::Day,
            refresh_window_seconds: 300,
        }
    }

    pub fn with_default_lifetime(mut self, lifetime: TokenLifetime) -> Self {
        self.default_lifetime = lifetime;
        self
    }

    pub fn with_refresh_window(mut self, seconds: i64) -> Self {
        self.refresh_window_seconds = seconds;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The only component allowed to transition session state.
pub struct SessionManager {
    store: SessionStore,
    backend: Arc<dyn AuthBackend>,
    config: SessionConfig,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(store: SessionStore, backend: Arc<dyn AuthBackend>) -> Self {
        Self::with_config(store, backend, SessionConfig::new())
    }

    pub fn with_config(
        store: SessionStore,
        backend: Arc<dyn AuthBackend>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Authenticate against the backend and establish a local session.
    ///
    /// Each attempt is stamped with a generation; a result that lands after
    /// a newer `login` or a `logout` is discarded instead of resurrecting an
    /// abandoned attempt. A storage write failure aborts the login so no
    /// half-authenticated state is left behind.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
        lifetime: Option<TokenLifetime>,
    ) -> SessionResult<Profile> {
        let attempt = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: role.as_str().to_string(),
        };
        let outcome = self.backend.login(&request).await.map_err(map_backend)?;

        if self.generation.load(Ordering::SeqCst) != attempt {
            debug!(email, "discarding superseded login result");
            return Err(SessionError::Superseded);
        }

        let confirmed_role: Role = outcome.user.role.parse()?;
        if confirmed_role != role {
            return Err(SessionError::InvalidCredentials(format!(
                "This account is registered as {confirmed_role}, not {role}"
            )));
        }

        let lifetime = lifetime.unwrap_or(self.config.default_lifetime);
        let claims = codec::issue_claims(
            outcome.user.email.clone(),
            confirmed_role,
            outcome.user.name.clone(),
            lifetime,
        );
        let token = codec::encode(&claims)?;

        let profile = Profile {
            id: outcome.user.id,
            email: outcome.user.email,
            role: confirmed_role,
            name: outcome.user.name,
        };
        let record = SessionRecord {
            token,
            profile: profile.clone(),
            api_token: outcome.api_token,
            refresh_token: outcome.refresh_token,
        };
        self.store.save(&record)?;

        info!(email = %profile.email, role = %profile.role, lifetime = %lifetime, "session established");
        Ok(profile)
    }

    /// Purge the local session. Never fails.
    pub fn logout(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.clear();
        info!("session cleared");
    }

    /// Logout that also asks the backend to invalidate its credential.
    /// The local purge always happens first; the notification is
    /// best-effort.
    pub async fn logout_notifying(&self) {
        let api_token = self.store.load().and_then(|session| session.api_token);
        self.logout();
        if let Some(token) = api_token {
            if let Err(err) = self.backend.invalidate(&token).await {
                warn!(error = %err, "logout notification failed");
            }
        }
    }

    /// Current state, read fresh from storage. No side effects beyond the
    /// store's self-healing clear on corruption.
    pub fn check_session(&self) -> SessionState {
        self.check_session_at(Utc::now())
    }

    pub fn check_session_at(&self, now: DateTime<Utc>) -> SessionState {
        match self.store.load() {
            None => SessionState::Anonymous,
            Some(session) if session.claims.is_expired_at(now) => SessionState::Expired,
            Some(session) => SessionState::Authenticated(ActiveSession {
                claims: session.claims,
                profile: session.profile,
            }),
        }
    }

    /// True when the session is live but within the refresh window of its
    /// expiry.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }

    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.store.load() {
            Some(session) if !session.claims.is_expired_at(now) => session
                .claims
                .is_expired_at(now + Duration::seconds(self.config.refresh_window_seconds)),
            _ => false,
        }
    }

    /// Exchange the stored refresh token for fresh credentials and re-mint
    /// the local token.
    ///
    /// When the backend rejects the exchange the session is cleared: a
    /// failed refresh demands a fresh login.
    pub async fn refresh(&self) -> SessionResult<()> {
        let Some(session) = self.store.load() else {
            return Err(SessionError::RefreshUnavailable);
        };
        let Some(refresh_token) = session.refresh_token else {
            return Err(SessionError::RefreshUnavailable);
        };

        let attempt = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = match self.backend.refresh(&refresh_token).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "refresh rejected; clearing session");
                self.logout();
                return Err(SessionError::RefreshUnavailable);
            }
        };
        if self.generation.load(Ordering::SeqCst) != attempt {
            return Err(SessionError::Superseded);
        }

        let claims = codec::issue_claims(
            session.profile.email.clone(),
            session.profile.role,
            session.profile.name.clone(),
            self.config.default_lifetime,
        );
        let token = codec::encode(&claims)?;
        let record = SessionRecord {
            token,
            profile: session.profile,
            api_token: Some(outcome.api_token),
            refresh_token: outcome.refresh_token.or(Some(refresh_token)),
        };
        self.store.save(&record)?;

        info!(email = %record.profile.email, "session refreshed");
        Ok(())
    }
}

fn map_backend(err: BackendError) -> SessionError {
    match err {
        BackendError::InvalidCredentials(message) => SessionError::InvalidCredentials(message),
        other => SessionError::Backend(other.to_string()),
    }
}
