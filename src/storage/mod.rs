//! Storage contracts consumed by the auth core.
//!
//! The core never talks to a database directly. It depends on these
//! async traits, which are implemented by the PostgreSQL store for
//! production and by the in-memory store for tests and database-less runs.
//! Implementations are expected to serialize writes per refresh-token row;
//! a concurrent refresh and revoke on the same token resolve last-write-wins.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ChirpRecord, Credential, RefreshTokenRecord, UserRecord};
use crate::error::StorageError;

/// Persistence of user accounts and their password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential registered for `email`
    ///
    /// # Returns
    /// * `Ok(Some(Credential))` - account exists
    /// * `Ok(None)` - no account with that email
    async fn find_credential_by_email(&self, email: &str)
        -> Result<Option<Credential>, StorageError>;

    /// Create a new account
    ///
    /// # Errors
    /// `StorageError::Duplicate` if the email is already registered
    async fn create_credential(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError>;

    /// Replace email and password hash of an existing account in one write
    ///
    /// # Errors
    /// `StorageError::NotFound` if the account does not exist
    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError>;

    /// Grant the paid membership; granting it twice is a no-op
    ///
    /// # Errors
    /// `StorageError::NotFound` if the account does not exist
    async fn upgrade_user(&self, user_id: Uuid) -> Result<UserRecord, StorageError>;
}

/// Persistence of refresh token records
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StorageError>;

    /// Look up the record for a plaintext token
    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError>;

    /// Set the revocation time of a token
    ///
    /// The earlier of the stored and the given time wins: repeated calls keep
    /// the first revocation, and a revocation scheduled for later is pulled
    /// forward.
    ///
    /// # Errors
    /// `StorageError::NotFound` if the token is unknown
    async fn set_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Persistence of chirps
#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StorageError>;

    /// All chirps, oldest first
    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StorageError>;

    async fn find_chirp(&self, chirp_id: Uuid) -> Result<Option<ChirpRecord>, StorageError>;

    /// # Errors
    /// `StorageError::NotFound` if the chirp does not exist
    async fn delete_chirp(&self, chirp_id: Uuid) -> Result<(), StorageError>;
}

/// Convenience bound for a store that covers every contract
pub trait Store: CredentialStore + RefreshTokenStore + ChirpStore {}

impl<T: CredentialStore + RefreshTokenStore + ChirpStore> Store for T {}
