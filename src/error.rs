/// Error Handling Module
///
/// Provides the error taxonomy for the whole application:
/// 1. Domain-specific error types for each auth component and the store
/// 2. The session-level `AuthError` the core returns to callers
/// 3. The HTTP-facing `AppError` with status mapping and structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::validators::ValidationError;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password does not match")]
    Mismatch,
    #[error("stored password hash is invalid: {0}")]
    InvalidHash(String),
}

/// Access token issuing and validation errors
///
/// Every validation kind is kept distinct for logs and tests, even though
/// the HTTP layer answers all of them with 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token is expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token subject is not a valid user id")]
    InvalidSubject,
}

/// Authorization header parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BearerError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is malformed")]
    MalformedHeader,
}

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StorageError::Duplicate(db_err.message().to_string())
            }
            // Foreign key violation: the referenced user does not exist
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                StorageError::NotFound
            }
            other => StorageError::Database(other.to_string()),
        }
    }
}

/// Refresh token lookup and revocation errors
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token has expired")]
    Expired,
    #[error(transparent)]
    Persistence(StorageError),
}

impl From<StorageError> for RefreshTokenError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => RefreshTokenError::NotFound,
            other => RefreshTokenError::Persistence(other),
        }
    }
}

/// Chirp posting and deletion errors
#[derive(Debug, Error)]
pub enum ChirpError {
    #[error("chirp is too long (maximum {0} characters)")]
    TooLong(usize),
    #[error("chirp body is empty")]
    Empty,
    #[error("chirp not found")]
    NotFound,
    #[error("chirp belongs to another user")]
    NotOwner,
    #[error(transparent)]
    Persistence(StorageError),
}

impl From<StorageError> for ChirpError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ChirpError::NotFound,
            other => ChirpError::Persistence(other),
        }
    }
}

/// ============================================================================
/// 2. SESSION-LEVEL ERROR
/// ============================================================================

/// Error returned by every `SessionService` operation
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; never says which
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Webhook caller presented a wrong or no API key
    #[error("invalid api key")]
    InvalidApiKey,
    #[error(transparent)]
    Bearer(#[from] BearerError),
    #[error(transparent)]
    AccessToken(#[from] TokenError),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
    #[error("password hashing failed")]
    Hashing(#[source] PasswordError),
    #[error(transparent)]
    Persistence(#[from] StorageError),
}

impl AuthError {
    /// True when the caller should answer "unauthorized"
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidApiKey | AuthError::Bearer(_) => true,
            AuthError::AccessToken(e) => !matches!(e, TokenError::Signing(_)),
            AuthError::RefreshToken(e) => !matches!(e, RefreshTokenError::Persistence(_)),
            // The account behind an otherwise valid token no longer exists
            AuthError::Persistence(StorageError::NotFound) => true,
            AuthError::Hashing(_) | AuthError::Persistence(_) => false,
        }
    }
}

/// ============================================================================
/// 3. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type returned by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Chirp(#[from] ChirpError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub error: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, error: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            error,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Status, machine code and client-safe message for this error
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Incorrect email or password".to_string(),
            ),
            AppError::Auth(AuthError::InvalidApiKey) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_API_KEY",
                "Invalid API key".to_string(),
            ),
            AppError::Auth(AuthError::Bearer(_)) => (
                StatusCode::UNAUTHORIZED,
                "MISSING_TOKEN",
                "Missing or invalid authorization header".to_string(),
            ),
            AppError::Auth(e) if e.is_unauthorized() => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".to_string(),
            ),
            AppError::Auth(AuthError::Persistence(StorageError::Duplicate(_)))
            | AppError::Storage(StorageError::Duplicate(_)) => (
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
                "Email already registered".to_string(),
            ),
            AppError::Chirp(e @ (ChirpError::TooLong(_) | ChirpError::Empty)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Chirp(ChirpError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "chirp not found".to_string())
            }
            AppError::Chirp(ChirpError::NotOwner) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "You can only delete your own chirps".to_string(),
            ),
            AppError::Auth(_) | AppError::Storage(_) | AppError::Chirp(ChirpError::Persistence(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
            }
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Auth(e) if e.is_unauthorized() => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication failed");
            }
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Chirp(e) if !matches!(e, ChirpError::Persistence(_)) => {
                tracing::warn!(error_id = error_id, error = %e, "Chirp request rejected");
            }
            AppError::NotFound(what) => {
                tracing::info!(error_id = error_id, resource = what, "Resource not found");
            }
            _ => {
                tracing::error!(error_id = error_id, error = %self, "Request failed");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, code, message) = self.classify();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            message,
            code.to_string(),
            status.as_u16(),
        ))
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_are_unauthorized() {
        for kind in [
            TokenError::Malformed("bad".to_string()),
            TokenError::Expired,
            TokenError::InvalidSignature,
            TokenError::InvalidIssuer,
            TokenError::InvalidSubject,
        ] {
            let err = AppError::from(AuthError::from(kind));
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_refresh_failures_are_unauthorized() {
        for kind in [
            RefreshTokenError::NotFound,
            RefreshTokenError::Revoked,
            RefreshTokenError::Expired,
        ] {
            let err = AppError::from(AuthError::from(kind));
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_signing_and_persistence_are_server_errors() {
        let signing = AppError::from(AuthError::from(TokenError::Signing("x".to_string())));
        assert_eq!(signing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let storage = AppError::from(AuthError::from(StorageError::Database("down".to_string())));
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let hashing = AppError::from(AuthError::Hashing(PasswordError::Hashing("x".to_string())));
        assert_eq!(hashing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let err = AppError::from(AuthError::from(StorageError::Duplicate("email".to_string())));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_chirp_errors_map_to_client_statuses() {
        assert_eq!(AppError::from(ChirpError::TooLong(140)).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(ChirpError::Empty).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(ChirpError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(ChirpError::NotOwner).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(ChirpError::from(StorageError::Database("down".to_string()))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_wrong_api_key_is_unauthorized() {
        let err = AppError::from(AuthError::InvalidApiKey);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_resource_is_not_found() {
        assert_eq!(AppError::NotFound("refresh token").status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_not_found_maps_to_refresh_not_found() {
        let err = RefreshTokenError::from(StorageError::NotFound);
        assert!(matches!(err, RefreshTokenError::NotFound));
    }

    #[test]
    fn test_messages_do_not_leak_secrets() {
        let err = AppError::from(AuthError::Hashing(PasswordError::Hashing(
            "hunter2".to_string(),
        )));
        let (_, _, message) = err.classify();
        assert!(!message.contains("hunter2"));
    }
}
