/// Bearer token extraction from the Authorization header
///
/// Extraction is positional: the header must hold at least two
/// whitespace-separated fields and the second one is the token. The scheme
/// label itself is not checked, so `Token abc` yields `abc` as well.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::BearerError;

/// Pull the raw token out of the request headers
///
/// # Errors
/// - `BearerError::MissingHeader` if there is no Authorization header
/// - `BearerError::MalformedHeader` if it is not UTF-8 or has fewer than two fields
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, BearerError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(BearerError::MissingHeader)?
        .to_str()
        .map_err(|_| BearerError::MalformedHeader)?;

    parse_authorization(value).map(str::to_string)
}

fn parse_authorization(value: &str) -> Result<&str, BearerError> {
    value
        .split_whitespace()
        .nth(1)
        .ok_or(BearerError::MalformedHeader)
}
