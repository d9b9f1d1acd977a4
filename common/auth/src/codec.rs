//! Encoding and parsing of the client-local session token.
//!
//! The token is three URL-safe base64 segments (`header.claims.checksum`).
//! The checksum is a SHA-256 digest over the first two segments and only
//! detects corruption in storage; it is not a signature, and the token must
//! never be accepted by a server as proof of identity. The backend's own
//! credential travels separately as an opaque string.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::claims::{Claims, ClaimsRepr};
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;

const TOKEN_TYPE: &str = "campus.session";
const TOKEN_VERSION: u8 = 1;

/// 2099-12-31T00:00:00Z, the expiry used for non-expiring sessions.
const UNBOUNDED_EXPIRY_EPOCH: i64 = 4_102_358_400;

/// Named token lifetimes offered by the login form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenLifetime {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    /// Non-expiring session; expires at the 2099 sentinel date.
    Unbounded,
}

impl TokenLifetime {
    pub const ALL: &'static [TokenLifetime] = &[
        TokenLifetime::Hour,
        TokenLifetime::Day,
        TokenLifetime::Week,
        TokenLifetime::Month,
        TokenLifetime::Year,
        TokenLifetime::Unbounded,
    ];

    /// Label used by the login form's duration picker.
    pub fn label(&self) -> &'static str {
        match self {
            TokenLifetime::Hour => "1h",
            TokenLifetime::Day => "24h",
            TokenLifetime::Week => "7d",
            TokenLifetime::Month => "30d",
            TokenLifetime::Year => "1y",
            TokenLifetime::Unbounded => "permanent",
        }
    }

    fn expiry_from(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TokenLifetime::Hour => issued_at + Duration::hours(1),
            TokenLifetime::Day => issued_at + Duration::hours(24),
            TokenLifetime::Week => issued_at + Duration::days(7),
            TokenLifetime::Month => issued_at + Duration::days(30),
            TokenLifetime::Year => issued_at + Duration::days(365),
            TokenLifetime::Unbounded => unbounded_expiry(),
        }
    }
}

impl fmt::Display for TokenLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TokenLifetime {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TokenLifetime::ALL
            .iter()
            .copied()
            .find(|lifetime| lifetime.label() == value)
            .ok_or_else(|| AuthError::InvalidLifetime(value.to_string()))
    }
}

fn unbounded_expiry() -> DateTime<Utc> {
    Utc.timestamp_opt(UNBOUNDED_EXPIRY_EPOCH, 0)
        .single()
        .expect("sentinel expiry is representable")
}

/// Build claims for a token issued at `now` with the given lifetime.
///
/// Timestamps are truncated to whole seconds, the token's wire resolution.
pub fn issue_claims_at(
    email: impl Into<String>,
    role: Role,
    name: impl Into<String>,
    lifetime: TokenLifetime,
    now: DateTime<Utc>,
) -> Claims {
    let issued_at = Utc
        .timestamp_opt(now.timestamp(), 0)
        .single()
        .unwrap_or(now);
    Claims {
        email: email.into(),
        role,
        name: name.into(),
        issued_at,
        expires_at: lifetime.expiry_from(issued_at),
    }
}

/// As [`issue_claims_at`], stamped with the current time.
pub fn issue_claims(
    email: impl Into<String>,
    role: Role,
    name: impl Into<String>,
    lifetime: TokenLifetime,
) -> Claims {
    issue_claims_at(email, role, name, lifetime, Utc::now())
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    typ: String,
    v: u8,
}

impl Header {
    fn current() -> Self {
        Self {
            typ: TOKEN_TYPE.to_string(),
            v: TOKEN_VERSION,
        }
    }
}

/// Serialize claims into the compact transmissible form.
pub fn encode(claims: &Claims) -> AuthResult<String> {
    let header = serde_json::to_vec(&Header::current())
        .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
    let payload = serde_json::to_vec(&ClaimsRepr::from(claims))
        .map_err(|err| AuthError::InvalidJson(err.to_string()))?;

    let header = URL_SAFE_NO_PAD.encode(header);
    let payload = URL_SAFE_NO_PAD.encode(payload);
    let checksum = checksum(&header, &payload);

    Ok(format!("{header}.{payload}.{checksum}"))
}

/// Strict inverse of [`encode`]. Does not judge expiry.
pub fn decode(token: &str) -> AuthResult<Claims> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(checksum_segment), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::InvalidShape);
    };

    if checksum(header, payload) != checksum_segment {
        return Err(AuthError::ChecksumMismatch);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|err| AuthError::InvalidEncoding(err.to_string()))?;
    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
    if header.typ != TOKEN_TYPE || header.v != TOKEN_VERSION {
        return Err(AuthError::InvalidClaim("typ", header.typ));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| AuthError::InvalidEncoding(err.to_string()))?;
    let repr: ClaimsRepr = serde_json::from_slice(&payload_bytes)
        .map_err(|err| AuthError::InvalidJson(err.to_string()))?;

    let claims = Claims::try_from(repr)?;
    debug!(email = %claims.email, role = %claims.role, "decoded session token");
    Ok(claims)
}

fn checksum(header: &str, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(header.as_bytes());
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims(lifetime: TokenLifetime) -> Claims {
        issue_claims_at(
            "amina@school.test",
            Role::Teacher,
            "Amina",
            lifetime,
            Utc.timestamp_opt(1_700_000_000, 0).single().expect("time"),
        )
    }

    #[test]
    fn encode_decode_round_trip() {
        for lifetime in TokenLifetime::ALL {
            let claims = sample_claims(*lifetime);
            let token = encode(&claims).expect("encode");
            let decoded = decode(&token).expect("decode");
            assert_eq!(decoded, claims, "round trip for {lifetime}");
        }
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("time");
        let claims = issue_claims_at("a@b.test", Role::Student, "A", TokenLifetime::Hour, now);
        assert!(!claims.is_expired_at(now));
        assert!(!claims.is_expired_at(now + Duration::minutes(59)));
    }

    #[test]
    fn token_expires_at_boundary() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("time");
        let claims = issue_claims_at("a@b.test", Role::Student, "A", TokenLifetime::Hour, now);
        assert!(claims.is_expired_at(claims.expires_at));
        assert!(claims.is_expired_at(claims.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn unbounded_lifetime_uses_sentinel_date() {
        let claims = sample_claims(TokenLifetime::Unbounded);
        assert_eq!(claims.expires_at.timestamp(), UNBOUNDED_EXPIRY_EPOCH);
    }

    #[test]
    fn lifetime_labels_round_trip() {
        for lifetime in TokenLifetime::ALL {
            assert_eq!(
                lifetime.label().parse::<TokenLifetime>().expect("parse"),
                *lifetime
            );
        }
    }

    #[test]
    fn zero_or_unknown_lifetime_is_rejected() {
        for label in ["0h", "-1h", "forever", ""] {
            let err = label.parse::<TokenLifetime>().expect_err("should reject");
            assert!(matches!(err, AuthError::InvalidLifetime(_)), "{label}");
        }
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        let claims = sample_claims(TokenLifetime::Day);
        let token = encode(&claims).expect("encode");
        let truncated = token.rsplit_once('.').expect("segments").0;
        assert!(matches!(decode(truncated), Err(AuthError::InvalidShape)));
        assert!(matches!(
            decode(&format!("{token}.extra")),
            Err(AuthError::InvalidShape)
        ));
    }

    #[test]
    fn decode_rejects_tampered_payload() {
        let claims = sample_claims(TokenLifetime::Day);
        let token = encode(&claims).expect("encode");
        let mut segments: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(b"{\"sub\":\"evil@school.test\"}");
        segments[1] = &forged;
        let forged_token = segments.join(".");
        assert!(matches!(
            decode(&forged_token),
            Err(AuthError::ChecksumMismatch)
        ));
    }

    #[test]
    fn decode_rejects_truncated_token() {
        let claims = sample_claims(TokenLifetime::Day);
        let token = encode(&claims).expect("encode");
        let truncated = &token[..token.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn decode_rejects_foreign_header() {
        let header = URL_SAFE_NO_PAD.encode(b"{\"typ\":\"JWT\",\"v\":1}");
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&ClaimsRepr::from(&sample_claims(TokenLifetime::Day)))
                .expect("payload"),
        );
        let checksum = checksum(&header, &payload);
        let token = format!("{header}.{payload}.{checksum}");
        assert!(matches!(
            decode(&token),
            Err(AuthError::InvalidClaim("typ", _))
        ));
    }
}
