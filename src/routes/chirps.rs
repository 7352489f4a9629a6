/// Chirp Routes
///
/// Reading is public; posting and deleting need an access token.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{extract_bearer_token, SessionService};
use crate::chirps::ChirpService;
use crate::error::{AppError, AuthError, ChirpError};

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

/// Resolve the caller from `Authorization: Bearer <access_token>`
fn caller(req: &HttpRequest, session: &SessionService) -> Result<Uuid, AppError> {
    let access_token = extract_bearer_token(req.headers()).map_err(AuthError::from)?;
    Ok(session.authenticate(&access_token)?)
}

/// Path IDs that are not UUIDs cannot name a chirp
fn chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| ChirpError::NotFound.into())
}

/// POST /api/chirps
///
/// # Errors
/// - 401: Missing, invalid or expired access token
/// - 400: Empty body or longer than 140 characters
pub async fn create_chirp(
    req: HttpRequest,
    form: web::Json<ChirpRequest>,
    session: web::Data<SessionService>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    let author = caller(&req, &session)?;
    let chirp = chirps.post(author, &form.body).await?;

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn list_chirps(chirps: web::Data<ChirpService>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(chirps.list().await?))
}

/// GET /api/chirps/{chirp_id}
///
/// # Errors
/// - 404: Unknown or malformed chirp ID
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    let chirp = chirps.get(chirp_id(&path)?).await?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 401: Missing, invalid or expired access token
/// - 404: Unknown or malformed chirp ID
/// - 403: Chirp posted by someone else
pub async fn delete_chirp(
    req: HttpRequest,
    path: web::Path<String>,
    session: web::Data<SessionService>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    let requester = caller(&req, &session)?;
    chirps.delete(requester, chirp_id(&path)?).await?;

    Ok(HttpResponse::NoContent().finish())
}
