/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt. The bcrypt output embeds the salt
/// and the cost factor, so verification needs nothing but the stored hash.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::PasswordError;

/// Salted one-way password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit bcrypt cost (4..=31)
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt
    ///
    /// # Errors
    /// Returns `PasswordError::Hashing` if bcrypt rejects the cost or fails
    /// to generate a salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash(password, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Verify a password against its hash
    ///
    /// bcrypt compares the derived hashes in constant time.
    ///
    /// # Errors
    /// - `PasswordError::Mismatch` if the password is wrong
    /// - `PasswordError::InvalidHash` if the stored hash cannot be parsed
    pub fn verify(&self, password: &str, hashed: &str) -> Result<(), PasswordError> {
        match verify(password, hashed) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_password() {
        let password = "hunter2";
        let hash = hasher().hash(password).expect("Failed to hash password");

        // Hash should not be the same as password
        assert_ne!(password, hash);
        // Hash should start with bcrypt identifier and embed the cost
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$04$"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hasher().hash("hunter2").expect("Failed to hash password");

        assert!(hasher().verify("hunter2", &hash).is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hasher().hash("hunter2").expect("Failed to hash password");

        let result = hasher().verify("password", &hash);
        assert!(matches!(result, Err(PasswordError::Mismatch)));
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let first = hasher().hash("hunter2").unwrap();
        let second = hasher().hash("hunter2").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        let result = hasher().verify("hunter2", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[test]
    fn test_invalid_cost_is_hashing_error() {
        let result = PasswordHasher::new(2).hash("hunter2");
        assert!(matches!(result, Err(PasswordError::Hashing(_))));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), DEFAULT_COST);
    }
}
