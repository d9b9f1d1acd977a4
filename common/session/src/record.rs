use campus_auth::Role;
use serde::{Deserialize, Serialize};

/// Backend-confirmed identity, denormalized from the token claims.
///
/// Invariant: `email` and `role` always agree with the stored token; the
/// store clears both together when they drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub role: Role,
    pub name: String,
}

/// Everything "logged in as" means, persisted as one JSON blob under one
/// key so a token can never be observed without its matching profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub profile: Profile,
    /// Backend-issued credential, kept opaque and only replayed verbatim
    /// in the Authorization header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
