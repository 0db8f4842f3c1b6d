//! One-time credential issuance.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::distr::Alphanumeric;
use rand::Rng;
use rand_core::OsRng;
use roster_core::AppError;

pub const PASSWORD_LENGTH: usize = 10;

/// A freshly generated password and its salted hash.
///
/// `plaintext` must reach the member exactly once, through the credential
/// notification. `Debug` never prints it.
pub struct IssuedCredentials {
    pub plaintext: String,
    pub hash: String,
}

impl fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("plaintext", &"[redacted]")
            .field("hash", &self.hash)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct CredentialIssuer {
    params: Params,
}

impl CredentialIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit argon2 cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Generate a password and hash it.
    ///
    /// The password is a short one-time value the member rotates on first
    /// login; it is not suitable as a token anywhere else.
    pub fn issue(&self) -> Result<IssuedCredentials, AppError> {
        let plaintext = generate_password();
        let hash = self.hash(&plaintext)?;
        Ok(IssuedCredentials { plaintext, hash })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;
        Ok(self
            .hasher()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_issue_returns_verifiable_hash() {
        let issuer = issuer();
        let credentials = issuer.issue().unwrap();

        assert_eq!(credentials.plaintext.len(), PASSWORD_LENGTH);
        assert!(credentials.plaintext.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(credentials.hash, credentials.plaintext);
        assert!(credentials.hash.starts_with("$argon2id$"));
        assert!(issuer.verify(&credentials.plaintext, &credentials.hash).unwrap());
        assert!(!issuer.verify("wrong-password", &credentials.hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let issuer = issuer();
        assert_ne!(issuer.hash("same").unwrap(), issuer.hash("same").unwrap());
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let credentials = issuer().issue().unwrap();
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains(&credentials.plaintext));
        assert!(rendered.contains("[redacted]"));
    }
}
