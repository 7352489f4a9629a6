//! In-process store backed by hash maps behind an async `RwLock`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChirpStore, CredentialStore, RefreshTokenStore};
use crate::domain::{ChirpRecord, Credential, RefreshTokenRecord, UserRecord};
use crate::error::StorageError;

#[derive(Debug, Clone)]
struct UserRow {
    record: UserRecord,
    hashed_password: String,
}

/// Volatile store; all data is lost when the process exits
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserRow>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    /// Kept in insertion order
    chirps: RwLock<Vec<ChirpRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh tokens ever persisted, revoked ones included
    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StorageError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|row| row.record.email == email)
            .map(|row| Credential {
                user: row.record.clone(),
                hashed_password: row.hashed_password.clone(),
            }))
    }

    async fn create_credential(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError> {
        let mut users = self.users.write().await;
        if users.values().any(|row| row.record.email == email) {
            return Err(StorageError::Duplicate(format!("email {}", email)));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            is_chirpy_red: false,
        };
        users.insert(
            record.id,
            UserRow {
                record: record.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );

        Ok(record)
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|row| row.record.email == email && row.record.id != user_id)
        {
            return Err(StorageError::Duplicate(format!("email {}", email)));
        }

        let row = users.get_mut(&user_id).ok_or(StorageError::NotFound)?;
        row.record.email = email.to_string();
        row.record.updated_at = Utc::now();
        row.hashed_password = hashed_password.to_string();

        Ok(row.record.clone())
    }

    async fn upgrade_user(&self, user_id: Uuid) -> Result<UserRecord, StorageError> {
        let mut users = self.users.write().await;
        let row = users.get_mut(&user_id).ok_or(StorageError::NotFound)?;
        if !row.record.is_chirpy_red {
            row.record.is_chirpy_red = true;
            row.record.updated_at = Utc::now();
        }

        Ok(row.record.clone())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StorageError> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(token) {
            return Err(StorageError::Duplicate("refresh token".to_string()));
        }

        let record = RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
        };
        tokens.insert(token.to_string(), record.clone());

        Ok(record)
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn set_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tokens = self.refresh_tokens.write().await;
        let record = tokens.get_mut(token).ok_or(StorageError::NotFound)?;
        record.revoked_at = Some(match record.revoked_at {
            Some(existing) => existing.min(revoked_at),
            None => revoked_at,
        });
        Ok(())
    }
}

#[async_trait]
impl ChirpStore for InMemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StorageError> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(StorageError::NotFound);
        }

        let now = Utc::now();
        let chirp = ChirpRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        self.chirps.write().await.push(chirp.clone());

        Ok(chirp)
    }

    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StorageError> {
        Ok(self.chirps.read().await.clone())
    }

    async fn find_chirp(&self, chirp_id: Uuid) -> Result<Option<ChirpRecord>, StorageError> {
        Ok(self
            .chirps
            .read()
            .await
            .iter()
            .find(|chirp| chirp.id == chirp_id)
            .cloned())
    }

    async fn delete_chirp(&self, chirp_id: Uuid) -> Result<(), StorageError> {
        let mut chirps = self.chirps.write().await;
        let index = chirps
            .iter()
            .position(|chirp| chirp.id == chirp_id)
            .ok_or(StorageError::NotFound)?;
        chirps.remove(index);
        Ok(())
    }
}
