/// Payment Provider Webhook
///
/// Polka notifies us when a user buys the Chirpy Red membership.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{extract_bearer_token, SessionService};
use crate::error::{AppError, AuthError, StorageError};
use crate::validators::ValidationError;

/// The only event that changes anything
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Shared key Polka sends as `Authorization: ApiKey <key>`
///
/// `None` accepts unauthenticated calls.
#[derive(Clone)]
pub struct WebhookKey(pub Option<String>);

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: String,
}

fn check_key(req: &HttpRequest, key: &WebhookKey) -> Result<(), AppError> {
    let Some(expected) = &key.0 else {
        return Ok(());
    };

    match extract_bearer_token(req.headers()) {
        Ok(presented) if presented == *expected => Ok(()),
        _ => {
            tracing::warn!("Webhook call with missing or wrong API key");
            Err(AuthError::InvalidApiKey.into())
        }
    }
}

/// POST /api/polka/webhooks
///
/// Other events are acknowledged and ignored.
///
/// # Errors
/// - 401: Wrong or missing API key (when one is configured)
/// - 400: `user_id` is not a UUID
/// - 404: Unknown user
pub async fn polka_webhook(
    req: HttpRequest,
    form: web::Json<WebhookEvent>,
    key: web::Data<WebhookKey>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    check_key(&req, &key)?;

    if form.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&form.data.user_id)
        .map_err(|_| ValidationError::InvalidFormat("user_id"))?;

    match session.upgrade_membership(user_id).await {
        Ok(_) => Ok(HttpResponse::NoContent().finish()),
        Err(AuthError::Persistence(StorageError::NotFound)) => Err(AppError::NotFound("user")),
        Err(e) => Err(e.into()),
    }
}
