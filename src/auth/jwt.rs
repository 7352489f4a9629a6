/// JWT Token Generation and Validation
///
/// Handles creation and validation of HS256-signed access tokens.
/// Access tokens are stateless and cannot be revoked; a leaked token stays
/// valid until its expiry, so the access-token TTL bounds the exposure.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::error::TokenError;

/// Default issuer label written into every access token
pub const DEFAULT_ISSUER: &str = "chirpy";

/// Issues and verifies access tokens with a shared HMAC secret
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl AccessTokenCodec {
    /// Create a codec for `secret` using the default issuer
    pub fn new(secret: &str) -> Self {
        Self::with_issuer(secret, DEFAULT_ISSUER)
    }

    pub fn with_issuer(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Issue a new access token for a user, valid for `ttl` from now
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if encoding fails
    pub fn issue(&self, user_id: Uuid, ttl: chrono::Duration) -> Result<String, TokenError> {
        self.issue_at(user_id, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, self.issuer.clone(), now, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate an access token and return the user it was issued to
    ///
    /// # Errors
    /// - `TokenError::InvalidSignature` if the token was signed with another secret
    /// - `TokenError::Expired` if the current time has reached `exp`
    /// - `TokenError::InvalidIssuer` if the issuer does not match
    /// - `TokenError::Malformed` if the token cannot be decoded at all
    /// - `TokenError::InvalidSubject` if `sub` is not a user ID
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        self.decode_claims(token, now)?.user_id()
    }

    /// Verify signature and expiry and return the full claims
    pub fn decode_claims(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the precise current instant
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
        other => TokenError::Malformed(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_generate_and_validate_token() {
        let codec = AccessTokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, Duration::seconds(5)).expect("Failed to generate token");
        let validated = codec.validate(&token).expect("Failed to validate token");

        assert_eq!(validated, user_id);
    }

    #[test]
    fn test_claims_carry_issuer_and_ttl() {
        let codec = AccessTokenCodec::new(SECRET);
        let now = Utc::now();

        let token = codec.issue_at(Uuid::new_v4(), Duration::hours(1), now).unwrap();
        let claims = codec.decode_claims(&token, now).unwrap();

        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let codec = AccessTokenCodec::new(SECRET);
        let token = codec
            .issue(Uuid::new_v4(), Duration::milliseconds(5))
            .expect("Failed to generate token");

        std::thread::sleep(std::time::Duration::from_millis(10));

        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_equal_to_now_is_expired() {
        let codec = AccessTokenCodec::new(SECRET);
        let now = Utc::now();
        let token = codec.issue_at(Uuid::new_v4(), Duration::seconds(30), now).unwrap();
        let claims = codec.decode_claims(&token, now).unwrap();
        let expires_at = claims.expires_at().unwrap();

        assert!(codec.validate_at(&token, expires_at - Duration::milliseconds(1)).is_ok());
        assert_eq!(codec.validate_at(&token, expires_at), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let token = AccessTokenCodec::new("secret")
            .issue(Uuid::new_v4(), Duration::seconds(5))
            .unwrap();

        let result = AccessTokenCodec::new("terces").validate(&token);

        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_invalid_token() {
        let codec = AccessTokenCodec::new(SECRET);
        let result = codec.validate("invalid.token.here");

        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_tampered_token() {
        let codec = AccessTokenCodec::new(SECRET);
        let token = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        // Replace the signature with another token's signature
        let other = AccessTokenCodec::new("another-secret")
            .issue(Uuid::new_v4(), Duration::hours(1))
            .unwrap();
        let (payload, _) = token.rsplit_once('.').unwrap();
        let (_, signature) = other.rsplit_once('.').unwrap();
        let tampered = format!("{}.{}", payload, signature);

        assert_eq!(codec.validate(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_wrong_issuer() {
        let token = AccessTokenCodec::with_issuer(SECRET, "someone-else")
            .issue(Uuid::new_v4(), Duration::hours(1))
            .unwrap();

        let result = AccessTokenCodec::new(SECRET).validate(&token);

        assert_eq!(result, Err(TokenError::InvalidIssuer));
    }

    #[test]
    fn test_non_uuid_subject() {
        let now = Utc::now();
        let claims = Claims {
            iss: DEFAULT_ISSUER.to_string(),
            sub: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = AccessTokenCodec::new(SECRET).validate_at(&token, now);

        assert_eq!(result, Err(TokenError::InvalidSubject));
    }

    #[test]
    fn test_debug_does_not_print_secret() {
        let codec = AccessTokenCodec::new(SECRET);
        assert!(!format!("{:?}", codec).contains(SECRET));
    }
}
