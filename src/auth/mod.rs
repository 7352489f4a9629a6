/// Authentication module
///
/// Handles password hashing, access token issuing/validation, refresh token
/// management, bearer header parsing and the session flows built on them.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use bearer::extract_bearer_token;
pub use claims::Claims;
pub use jwt::{AccessTokenCodec, DEFAULT_ISSUER};
pub use password::PasswordHasher;
pub use refresh_token::{generate_refresh_token, RefreshTokenIssuer, REFRESH_TOKEN_TTL_DAYS};
pub use session::{LoginSession, SessionService, ACCESS_TOKEN_TTL_SECONDS};
