use std::sync::Arc;

use tracing::warn;

use campus_auth::{decode, Claims};

use crate::error::StorageError;
use crate::record::{Profile, SessionRecord};
use crate::storage::Storage;

/// The one storage key the session layer owns.
pub const SESSION_KEY: &str = "campus.session";

/// A decoded, internally consistent session read back from storage.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub token: String,
    pub claims: Claims,
    pub profile: Profile,
    pub api_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Exclusive owner of the persisted session record.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persist the record in a single write.
    pub fn save(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let blob = serde_json::to_string(record)
            .map_err(|err| StorageError::new("serialize", err.to_string()))?;
        self.storage.set(SESSION_KEY, &blob)
    }

    /// Read the record back, decoding its token.
    ///
    /// An unreadable blob, an undecodable token, or a profile that
    /// disagrees with the claims is self-healed: storage is cleared and
    /// `None` returned. Never an error to the caller.
    pub fn load(&self) -> Option<LoadedSession> {
        let blob = self.storage.get(SESSION_KEY)?;

        let record: SessionRecord = match serde_json::from_str(&blob) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "stored session record unreadable; clearing");
                self.clear();
                return None;
            }
        };

        let claims = match decode(&record.token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "stored session token undecodable; clearing");
                self.clear();
                return None;
            }
        };

        if claims.email != record.profile.email || claims.role != record.profile.role {
            warn!(
                token_email = %claims.email,
                profile_email = %record.profile.email,
                "stored profile disagrees with token claims; clearing"
            );
            self.clear();
            return None;
        }

        Some(LoadedSession {
            token: record.token,
            claims,
            profile: record.profile,
            api_token: record.api_token,
            refresh_token: record.refresh_token,
        })
    }

    /// Remove the record. Idempotent; storage failures are logged, not
    /// surfaced.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(SESSION_KEY) {
            warn!(error = %err, "failed to clear session record");
        }
    }
}
