/// Input validation for account data
///
/// Applied when an account is created or its credentials are changed.
/// Login input is not checked here: a bad email or password there is
/// reported as invalid credentials like any other mismatch.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// RFC 5321 path limit
const EMAIL_MAX_LEN: usize = 254;
const EMAIL_MIN_LEN: usize = 3;
/// bcrypt ignores everything past 72 bytes
const PASSWORD_MAX_BYTES: usize = 72;

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    )
    .unwrap();
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0} must be at least {1} characters")]
    TooShort(&'static str, usize),
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
    #[error("{0} is not well formed")]
    InvalidFormat(&'static str),
}

/// Email and password that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredentials {
    pub email: String,
    pub password: String,
}

impl NewCredentials {
    /// Validate raw input; the email is returned trimmed, the password as given
    pub fn parse(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = is_valid_email(email)?;
        is_valid_password(password)?;

        Ok(Self {
            email,
            password: password.to_owned(),
        })
    }
}

/// Check an email address and return it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();

    match email.len() {
        0 => Err(ValidationError::EmptyField("email")),
        n if n < EMAIL_MIN_LEN => Err(ValidationError::TooShort("email", EMAIL_MIN_LEN)),
        n if n > EMAIL_MAX_LEN => Err(ValidationError::TooLong("email", EMAIL_MAX_LEN)),
        _ if !EMAIL_PATTERN.is_match(email) => Err(ValidationError::InvalidFormat("email")),
        _ => Ok(email.to_owned()),
    }
}

/// Check a new password
///
/// Only presence and the bcrypt input limit are enforced; longer inputs
/// would be silently truncated by the hasher.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(ValidationError::TooLong("password", PASSWORD_MAX_BYTES));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in ["walt@breakingbad.com", "jesse.pinkman@abq.co.uk", "saul+law@bettercall.com"] {
            assert_eq!(is_valid_email(email).unwrap(), email);
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(is_valid_email("  walt@breakingbad.com ").unwrap(), "walt@breakingbad.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["walt", "walt@", "@breakingbad.com", "walt@@breakingbad.com", "walt @bb.com"] {
            assert_eq!(
                is_valid_email(email),
                Err(ValidationError::InvalidFormat("email")),
                "{email}"
            );
        }
    }

    #[test]
    fn enforces_email_length() {
        let long = format!("{}@breakingbad.com", "w".repeat(250));
        assert_eq!(is_valid_email(&long), Err(ValidationError::TooLong("email", EMAIL_MAX_LEN)));
        assert_eq!(is_valid_email("a@"), Err(ValidationError::TooShort("email", EMAIL_MIN_LEN)));
        assert_eq!(is_valid_email("   "), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn password_rules() {
        assert!(is_valid_password("hunter2").is_ok());
        assert!(is_valid_password(&"p".repeat(72)).is_ok());
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
        assert_eq!(
            is_valid_password(&"p".repeat(73)),
            Err(ValidationError::TooLong("password", PASSWORD_MAX_BYTES))
        );
    }

    #[test]
    fn parse_new_credentials() {
        let creds = NewCredentials::parse(" walt@breakingbad.com", "hunter2").unwrap();
        assert_eq!(creds.email, "walt@breakingbad.com");
        assert_eq!(creds.password, "hunter2");

        assert_eq!(
            NewCredentials::parse("walt@breakingbad.com", ""),
            Err(ValidationError::EmptyField("password"))
        );
    }
}
