/// Account Routes
///
/// Account creation and credential update.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::{extract_bearer_token, SessionService};
use crate::error::{AppError, AuthError};
use crate::validators::{NewCredentials, ValidationError};

/// Email and password, used for both creation and update
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or empty password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let creds = NewCredentials::parse(&form.email, &form.password)?;

    let user = session.register(&creds.email, &creds.password).await?;

    Ok(HttpResponse::Created().json(user))
}

/// PUT /api/users
///
/// Replace email and password of the caller.
/// Requires `Authorization: Bearer <access_token>`.
///
/// # Errors
/// - 401: Missing, invalid or expired access token
/// - 400: Unreadable body, invalid email or empty password
/// - 409: Email taken by another account
pub async fn update_user(
    req: HttpRequest,
    body: web::Bytes,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let access_token = extract_bearer_token(req.headers()).map_err(AuthError::from)?;
    let user_id = session.authenticate(&access_token)?;

    // The body is only decoded once the caller is known
    let form: CredentialsRequest = serde_json::from_slice(&body)
        .map_err(|_| ValidationError::InvalidFormat("request body"))?;
    let creds = NewCredentials::parse(&form.email, &form.password)?;

    let user = session
        .update_credentials_for(user_id, &creds.email, &creds.password)
        .await?;

    Ok(HttpResponse::Ok().json(user))
}
