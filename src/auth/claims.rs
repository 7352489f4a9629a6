/// JWT Claims structure
///
/// Represents the payload of an access token: registered claims from
/// RFC 7519 plus a random `jti` so that every issued token is unique.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token ID
    pub jti: String,
}

impl Claims {
    /// Create claims for `user_id` issued at `now` and living for `ttl`
    ///
    /// Timestamps are whole seconds; `exp` is truncated, never rounded up.
    pub fn new(
        user_id: Uuid,
        issuer: String,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            iss: issuer,
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenError::InvalidSubject` if `sub` is not a UUID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSubject)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Check if the token has expired at `now`
    ///
    /// The boundary is exclusive on the valid side: `now == exp` is expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |expires_at| now >= expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, millis * 1_000_000).unwrap()
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let now = at(1_700_000_000, 0);
        let claims = Claims::new(user_id, "chirpy".to_string(), now, Duration::hours(1));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, "chirpy");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = at(1_700_000_000, 0);
        let claims = Claims::new(Uuid::new_v4(), "chirpy".to_string(), now, Duration::seconds(10));

        assert!(!claims.is_expired_at(at(1_700_000_009, 999)));
        assert!(claims.is_expired_at(at(1_700_000_010, 0)));
    }

    #[test]
    fn test_sub_second_ttl_truncates() {
        let now = at(1_700_000_000, 100);
        let claims = Claims::new(Uuid::new_v4(), "chirpy".to_string(), now, Duration::milliseconds(5));

        assert_eq!(claims.exp, claims.iat);
        assert!(claims.is_expired_at(now + Duration::milliseconds(10)));
    }

    #[test]
    fn test_each_token_gets_its_own_id() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let first = Claims::new(user_id, "chirpy".to_string(), now, Duration::hours(1));
        let second = Claims::new(user_id, "chirpy".to_string(), now, Duration::hours(1));

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "chirpy".to_string(), Utc::now(), Duration::hours(1));

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), "chirpy".to_string(), Utc::now(), Duration::hours(1));
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(TokenError::InvalidSubject));
    }
}
