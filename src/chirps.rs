/// Chirp posting, reading and deletion
///
/// Callers authenticate first and pass the resulting user ID in; this
/// module only enforces the body limits and chirp ownership.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ChirpRecord;
use crate::error::ChirpError;
use crate::storage::ChirpStore;

/// Longest accepted chirp body, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

#[derive(Clone)]
pub struct ChirpService {
    store: Arc<dyn ChirpStore>,
}

impl ChirpService {
    pub fn new(store: Arc<dyn ChirpStore>) -> Self {
        Self { store }
    }

    /// Post a chirp as `author`
    ///
    /// # Errors
    /// - `ChirpError::Empty` if the body is blank
    /// - `ChirpError::TooLong` if the body exceeds `MAX_CHIRP_LENGTH`
    /// - `ChirpError::NotFound` if the author account no longer exists
    pub async fn post(&self, author: Uuid, body: &str) -> Result<ChirpRecord, ChirpError> {
        if body.trim().is_empty() {
            return Err(ChirpError::Empty);
        }
        if body.chars().count() > MAX_CHIRP_LENGTH {
            return Err(ChirpError::TooLong(MAX_CHIRP_LENGTH));
        }

        let chirp = self.store.create_chirp(author, body).await?;

        tracing::info!(user_id = %author, chirp_id = %chirp.id, "Chirp posted");
        Ok(chirp)
    }

    pub async fn list(&self) -> Result<Vec<ChirpRecord>, ChirpError> {
        Ok(self.store.list_chirps().await?)
    }

    pub async fn get(&self, chirp_id: Uuid) -> Result<ChirpRecord, ChirpError> {
        self.store
            .find_chirp(chirp_id)
            .await?
            .ok_or(ChirpError::NotFound)
    }

    /// Delete a chirp on behalf of `requester`
    ///
    /// # Errors
    /// - `ChirpError::NotFound` if the chirp does not exist
    /// - `ChirpError::NotOwner` if someone else posted it
    pub async fn delete(&self, requester: Uuid, chirp_id: Uuid) -> Result<(), ChirpError> {
        let chirp = self.get(chirp_id).await?;
        if chirp.user_id != requester {
            tracing::warn!(user_id = %requester, chirp_id = %chirp_id, "Attempt to delete another user's chirp");
            return Err(ChirpError::NotOwner);
        }

        self.store.delete_chirp(chirp_id).await?;

        tracing::info!(user_id = %requester, chirp_id = %chirp_id, "Chirp deleted");
        Ok(())
    }
}
