use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::roles::Role;

/// Identity facts carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub role: Role,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// True iff the token has lapsed as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Wire representation with JWT-style field names and epoch-second timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClaimsRepr {
    sub: String,
    role: String,
    name: String,
    iat: i64,
    exp: i64,
}

impl From<&Claims> for ClaimsRepr {
    fn from(value: &Claims) -> Self {
        Self {
            sub: value.email.clone(),
            role: value.role.as_str().to_string(),
            name: value.name.clone(),
            iat: value.issued_at.timestamp(),
            exp: value.expires_at.timestamp(),
        }
    }
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let role = value.role.parse::<Role>()?;

        let issued_at = Utc
            .timestamp_opt(value.iat, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("iat", value.iat.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        if expires_at <= issued_at {
            return Err(AuthError::InvalidClaim("exp", value.exp.to_string()));
        }

        Ok(Self {
            email: value.sub,
            role,
            name: value.name,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repr(iat: i64, exp: i64) -> ClaimsRepr {
        ClaimsRepr {
            sub: "amina@school.test".to_string(),
            role: "teacher".to_string(),
            name: "Amina".to_string(),
            iat,
            exp,
        }
    }

    #[test]
    fn lifts_valid_repr() {
        let claims = Claims::try_from(repr(1_700_000_000, 1_700_086_400)).expect("claims");
        assert_eq!(claims.email, "amina@school.test");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.issued_at.timestamp(), 1_700_000_000);
        assert_eq!(claims.expires_at.timestamp(), 1_700_086_400);
    }

    #[test]
    fn rejects_expiry_not_after_issue() {
        let err = Claims::try_from(repr(1_700_000_000, 1_700_000_000)).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidClaim("exp", _)));
    }

    #[test]
    fn rejects_unknown_role() {
        let mut value = repr(1_700_000_000, 1_700_086_400);
        value.role = "janitor".to_string();
        let err = Claims::try_from(value).expect_err("should reject");
        assert!(matches!(err, AuthError::UnknownRole(_)));
    }

    #[test]
    fn rejects_unrepresentable_timestamp() {
        let err = Claims::try_from(repr(i64::MAX, i64::MAX)).expect_err("should reject");
        assert!(matches!(err, AuthError::InvalidClaim("iat", _)));
    }
}
