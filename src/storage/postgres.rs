//! PostgreSQL implementation of the storage contracts.
//!
//! Refresh tokens are hashed with SHA-256 before they are written, so a
//! leaked `refresh_tokens` table does not yield usable tokens. Callers
//! always pass and receive the plaintext value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChirpStore, CredentialStore, RefreshTokenStore};
use crate::domain::{ChirpRecord, Credential, RefreshTokenRecord, UserRecord};
use crate::error::StorageError;

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

type UserRow = (Uuid, DateTime<Utc>, DateTime<Utc>, String, bool);

fn to_user_record((id, created_at, updated_at, email, is_chirpy_red): UserRow) -> UserRecord {
    UserRecord {
        id,
        created_at,
        updated_at,
        email,
        is_chirpy_red,
    }
}

type ChirpRow = (Uuid, DateTime<Utc>, DateTime<Utc>, String, Uuid);

fn to_chirp_record((id, created_at, updated_at, body, user_id): ChirpRow) -> ChirpRecord {
    ChirpRecord {
        id,
        created_at,
        updated_at,
        body,
        user_id,
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StorageError> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>, String, bool, String)>(
            r#"
            SELECT id, created_at, updated_at, email, is_chirpy_red, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, created_at, updated_at, email, is_chirpy_red, hashed_password)| Credential {
                user: to_user_record((id, created_at, updated_at, email, is_chirpy_red)),
                hashed_password,
            },
        ))
    }

    async fn create_credential(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, email, is_chirpy_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_user_record(row))
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, is_chirpy_red
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(to_user_record(row))
    }

    async fn upgrade_user(&self, user_id: Uuid) -> Result<UserRecord, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET is_chirpy_red = TRUE,
                updated_at = CASE WHEN is_chirpy_red THEN updated_at ELSE $2 END
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, is_chirpy_red
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(to_user_record(row))
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StorageError> {
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            created_at,
            expires_at,
            revoked_at: None,
        })
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)>(
            r#"
            SELECT user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, created_at, expires_at, revoked_at)| RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            created_at,
            expires_at,
            revoked_at,
        }))
    }

    async fn set_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = LEAST(COALESCE(revoked_at, $2), $2), updated_at = $2
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .bind(revoked_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl ChirpStore for PgStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StorageError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ChirpRow>(
            r#"
            INSERT INTO chirps (id, created_at, updated_at, body, user_id)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_chirp_record(row))
    }

    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StorageError> {
        let rows = sqlx::query_as::<_, ChirpRow>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_chirp_record).collect())
    }

    async fn find_chirp(&self, chirp_id: Uuid) -> Result<Option<ChirpRecord>, StorageError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE id = $1
            "#,
        )
        .bind(chirp_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(to_chirp_record))
    }

    async fn delete_chirp(&self, chirp_id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(chirp_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
