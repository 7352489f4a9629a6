/// Refresh Token Management
///
/// Handles refresh token generation, persistence, validation, and revocation.
/// Refresh tokens are:
/// - 32 bytes from the OS random source, hex-encoded (64 characters)
/// - Opaque to clients; all state lives in the store
/// - Reusable until they expire or are revoked (no rotation on refresh)

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::domain::RefreshTokenRecord;
use crate::error::RefreshTokenError;
use crate::storage::RefreshTokenStore;

/// Number of random bytes behind every refresh token
const TOKEN_BYTES: usize = 32;

/// Lifetime of a refresh token
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Generate a new cryptographically secure refresh token
///
/// Uniqueness is enforced by the store, not here.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Creates, authorizes and revokes refresh tokens through a store
#[derive(Clone)]
pub struct RefreshTokenIssuer {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenIssuer {
    pub fn new(store: Arc<dyn RefreshTokenStore>) -> Self {
        Self {
            store,
            ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }

    /// Generate and persist a new refresh token for a user
    ///
    /// # Errors
    /// Returns `RefreshTokenError::Persistence` if the store fails
    pub async fn create(&self, user_id: Uuid) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let token = generate_refresh_token();
        let expires_at = Utc::now() + self.ttl;

        let record = self
            .store
            .create_refresh_token(&token, user_id, expires_at)
            .await
            .map_err(RefreshTokenError::Persistence)?;

        tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Refresh token created");
        Ok(record)
    }

    /// Validate a refresh token and return the user it belongs to
    ///
    /// Checks, in order:
    /// 1. Token exists in the store
    /// 2. Token has not been revoked (revocation applies from `revoked_at` on)
    /// 3. Token has not expired
    pub async fn authorize(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        self.authorize_at(token, Utc::now()).await
    }

    pub async fn authorize_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, RefreshTokenError> {
        let record = self
            .store
            .find_refresh_token(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)?;

        if record.is_revoked_at(now) {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(RefreshTokenError::Revoked);
        }

        if record.is_expired_at(now) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(RefreshTokenError::Expired);
        }

        Ok(record.user_id)
    }

    /// Revoke a refresh token as of now
    ///
    /// Revoking an already-revoked token succeeds and keeps the first
    /// revocation time; a revocation scheduled for later is brought forward.
    ///
    /// # Errors
    /// Returns `RefreshTokenError::NotFound` if the token is unknown
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        self.store
            .set_refresh_token_revoked(token, Utc::now())
            .await
            .map_err(RefreshTokenError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn issuer() -> (Arc<InMemoryStore>, RefreshTokenIssuer) {
        let store = Arc::new(InMemoryStore::new());
        let issuer = RefreshTokenIssuer::new(store.clone());
        (store, issuer)
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        // Token should be 64 lowercase hex characters
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[tokio::test]
    async fn test_create_sets_sixty_day_expiry() {
        let (_, issuer) = issuer();
        let before = Utc::now();

        let record = issuer.create(Uuid::new_v4()).await.unwrap();

        assert!(record.revoked_at.is_none());
        assert!(record.expires_at >= before + Duration::days(60));
        assert!(record.expires_at <= Utc::now() + Duration::days(60));
    }

    #[tokio::test]
    async fn test_authorize_returns_owner() {
        let (_, issuer) = issuer();
        let user_id = Uuid::new_v4();
        let record = issuer.create(user_id).await.unwrap();

        assert_eq!(issuer.authorize(&record.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (_, issuer) = issuer();
        let result = issuer.authorize(&generate_refresh_token()).await;

        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }

    #[tokio::test]
    async fn test_revoked_token_rejected_before_expiry() {
        let (_, issuer) = issuer();
        let record = issuer.create(Uuid::new_v4()).await.unwrap();

        issuer.revoke(&record.token).await.unwrap();
        let result = issuer.authorize_at(&record.token, Utc::now() + Duration::seconds(1)).await;

        assert!(matches!(result, Err(RefreshTokenError::Revoked)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (store, issuer) = issuer();
        let token = generate_refresh_token();
        let now = Utc::now();
        store
            .create_refresh_token(&token, Uuid::new_v4(), now - Duration::seconds(1))
            .await
            .unwrap();

        let result = issuer.authorize_at(&token, now).await;

        assert!(matches!(result, Err(RefreshTokenError::Expired)));
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_exclusive() {
        let (_, issuer) = issuer();
        let record = issuer.create(Uuid::new_v4()).await.unwrap();

        let just_before = issuer
            .authorize_at(&record.token, record.expires_at - Duration::milliseconds(1))
            .await;
        let at_expiry = issuer.authorize_at(&record.token, record.expires_at).await;

        assert!(just_before.is_ok());
        assert!(matches!(at_expiry, Err(RefreshTokenError::Expired)));
    }

    #[tokio::test]
    async fn test_future_revocation_not_yet_effective() {
        let (store, issuer) = issuer();
        let record = issuer.create(Uuid::new_v4()).await.unwrap();
        let now = Utc::now();
        store
            .set_refresh_token_revoked(&record.token, now + Duration::hours(1))
            .await
            .unwrap();

        assert!(issuer.authorize_at(&record.token, now).await.is_ok());
        assert!(matches!(
            issuer.authorize_at(&record.token, now + Duration::hours(2)).await,
            Err(RefreshTokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_revoke_overrides_scheduled_revocation() {
        let (store, issuer) = issuer();
        let record = issuer.create(Uuid::new_v4()).await.unwrap();
        store
            .set_refresh_token_revoked(&record.token, Utc::now() + Duration::days(30))
            .await
            .unwrap();

        issuer.revoke(&record.token).await.unwrap();

        assert!(matches!(
            issuer.authorize(&record.token).await,
            Err(RefreshTokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_revoke_twice_is_idempotent() {
        let (_, issuer) = issuer();
        let record = issuer.create(Uuid::new_v4()).await.unwrap();

        issuer.revoke(&record.token).await.unwrap();
        issuer.revoke(&record.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let (_, issuer) = issuer();
        let result = issuer.revoke("missing").await;

        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }
}
