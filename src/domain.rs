/// Domain records shared between the auth core and the storage layer
///
/// The auth core never sees raw passwords beyond the verification call; it
/// only produces and consumes the bcrypt hash held in a `Credential`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A user account paired with its password hash
#[derive(Debug, Clone)]
pub struct Credential {
    pub user: UserRecord,
    pub hashed_password: String,
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    /// Paid membership, set by the payment provider webhook
    pub is_chirpy_red: bool,
}

/// A short message posted by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

/// Server-side state of an opaque refresh token
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Revocation takes effect once `now` reaches `revoked_at`.
    ///
    /// A revocation timestamp in the future does not yet apply. An explicit
    /// revoke pulls a scheduled revocation forward to the instant of the call.
    pub fn is_revoked_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.map_or(false, |revoked_at| now >= revoked_at)
    }

    /// Expiry is exclusive: a token whose `expires_at` equals `now` is expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
