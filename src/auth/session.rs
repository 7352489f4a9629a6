/// Session orchestration
///
/// Ties the password hasher, the access token codec and the refresh token
/// issuer together. A session moves through
/// `Unauthenticated -> Authenticated -> AccessExpired -> RefreshExpired/Revoked`;
/// the last state is terminal and requires a new login.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::RefreshTokenIssuer;
use crate::domain::UserRecord;
use crate::error::{AuthError, PasswordError};
use crate::storage::{CredentialStore, Store};

/// Lifetime of an access token
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Verified against when the email is unknown, so both login failures cost
/// one bcrypt verification
const DUMMY_PASSWORD: &str = "chirpy-unknown-account";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication entry points used by every HTTP handler
#[derive(Clone)]
pub struct SessionService {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenIssuer,
    access_ttl: Duration,
    dummy_hash: Arc<OnceCell<String>>,
}

impl SessionService {
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        hasher: PasswordHasher,
        codec: AccessTokenCodec,
    ) -> Self {
        Self {
            credentials: store.clone(),
            hasher,
            codec,
            refresh_tokens: RefreshTokenIssuer::new(store),
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Create a new account
    ///
    /// # Errors
    /// - `AuthError::Hashing` if the password cannot be hashed
    /// - `AuthError::Persistence` if the store fails or the email is taken
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, AuthError> {
        let hashed = self.hasher.hash(password).map_err(AuthError::Hashing)?;
        let user = self.credentials.create_credential(email, &hashed).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue an access + refresh token pair
    ///
    /// Unknown email and wrong password both yield
    /// `AuthError::InvalidCredentials`. Nothing is persisted unless both
    /// tokens could be produced.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let credential = match self.credentials.find_credential_by_email(email).await? {
            Some(credential) => credential,
            None => {
                tracing::info!("Login attempt for unknown email");
                self.burn_verification(password).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if let Err(e) = self.hasher.verify(password, &credential.hashed_password) {
            match e {
                PasswordError::Mismatch => {
                    tracing::info!(user_id = %credential.user.id, "Login attempt with wrong password")
                }
                other => {
                    tracing::error!(user_id = %credential.user.id, error = %other, "Stored password hash unusable")
                }
            }
            return Err(AuthError::InvalidCredentials);
        }

        let user_id = credential.user.id;
        let access_token = self.codec.issue(user_id, self.access_ttl)?;
        let refresh = self.refresh_tokens.create(user_id).await?;

        tracing::info!(user_id = %user_id, "User logged in");

        Ok(LoginSession {
            user: credential.user,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Mint a new access token from a refresh token
    ///
    /// The refresh token is not rotated and stays usable until it expires or
    /// is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user_id = self.refresh_tokens.authorize(refresh_token).await?;
        let access_token = self.codec.issue(user_id, self.access_ttl)?;

        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token; repeated calls succeed
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await?;

        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Validate an access token and return the user it identifies
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        self.codec.validate(access_token).map_err(|e| {
            tracing::warn!(error = %e, "Access token rejected");
            AuthError::AccessToken(e)
        })
    }

    /// Replace the email and password of the account behind `access_token`
    ///
    /// The token is validated before anything is hashed or written; the
    /// new email and hash are persisted in a single store call.
    pub async fn update_credentials(
        &self,
        access_token: &str,
        new_email: &str,
        new_password: &str,
    ) -> Result<UserRecord, AuthError> {
        let user_id = self.authenticate(access_token)?;
        self.update_credentials_for(user_id, new_email, new_password)
            .await
    }

    /// Same as `update_credentials` for a caller already authenticated
    pub async fn update_credentials_for(
        &self,
        user_id: Uuid,
        new_email: &str,
        new_password: &str,
    ) -> Result<UserRecord, AuthError> {
        let hashed = self.hasher.hash(new_password).map_err(AuthError::Hashing)?;
        let user = self
            .credentials
            .update_credential(user_id, new_email, &hashed)
            .await?;

        tracing::info!(user_id = %user_id, "Credentials updated");
        Ok(user)
    }

    /// Grant the paid membership to an account
    ///
    /// # Errors
    /// `AuthError::Persistence(StorageError::NotFound)` if the account is unknown
    pub async fn upgrade_membership(&self, user_id: Uuid) -> Result<UserRecord, AuthError> {
        let user = self.credentials.upgrade_user(user_id).await?;

        tracing::info!(user_id = %user_id, "Membership upgraded");
        Ok(user)
    }

    /// Spend one bcrypt verification on a throwaway hash
    async fn burn_verification(&self, password: &str) {
        let hasher = self.hasher;
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| async move { hasher.hash(DUMMY_PASSWORD) })
            .await;

        match dummy {
            Ok(hash) => {
                let _ = self.hasher.verify(password, hash);
            }
            Err(e) => tracing::error!(error = %e, "Could not prepare dummy password hash"),
        }
    }
}
