/// Session Routes
///
/// Login, access-token refresh and refresh-token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{extract_bearer_token, SessionService};
use crate::error::{AppError, AuthError, RefreshTokenError};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the user profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

/// Token refresh response
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 401: Invalid credentials (email not found or wrong password, indistinguishable)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let login = session.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: login.user.id,
        created_at: login.user.created_at,
        updated_at: login.user.updated_at,
        email: login.user.email,
        is_chirpy_red: login.user.is_chirpy_red,
        token: login.access_token,
        refresh_token: login.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Mint a new access token. Requires `Authorization: Bearer <refresh_token>`.
///
/// # Errors
/// - 401: Missing header, or unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer_token(req.headers()).map_err(AuthError::from)?;
    let token = session.refresh(&refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Revoke a refresh token. Requires `Authorization: Bearer <refresh_token>`.
/// Revoking an already-revoked token succeeds again.
///
/// # Errors
/// - 401: Missing or malformed Authorization header
/// - 404: Unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer_token(req.headers()).map_err(AuthError::from)?;

    match session.revoke(&refresh_token).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(AuthError::RefreshToken(RefreshTokenError::NotFound)) => {
            Err(AppError::NotFound("refresh token"))
        }
        Err(e) => Err(e.into()),
    }
}
