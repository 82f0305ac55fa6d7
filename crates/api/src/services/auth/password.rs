//! Argon2id password hashing.
//!
//! Hashing and verification are CPU-bound by design, so both run on the
//! blocking thread pool instead of an async worker.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::AuthError;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length. Caps the cost of a single hash.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Check password length bounds (in characters).
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` when the password is out of bounds.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway password, verified against when an email is
    /// unknown so that login takes the same time either way.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    /// Create a hasher with the given memory cost (KiB) and iterations.
    ///
    /// Computes one hash up front for the unknown-email path.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the parameters are rejected by
    /// Argon2 (for example a memory cost below 8 KiB).
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            tracing::error!(error = %e, "Invalid Argon2 parameters");
            AuthError::PasswordHash
        })?;
        let dummy_hash = hash_with(&params, "vitrinex-timing-equalizer")?;

        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash a password into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hash task failed");
                AuthError::PasswordHash
            })?
    }

    /// Check a password against a stored PHC string.
    ///
    /// A malformed stored hash counts as a mismatch.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the blocking task fails.
    pub async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&hash) else {
                tracing::error!("Stored password hash is not a valid PHC string");
                return false;
            };
            // Parameters are read back from the PHC string
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verify task failed");
            AuthError::PasswordHash
        })
    }

    /// Spend one verification on the throwaway hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the blocking task fails.
    pub async fn verify_dummy(&self, password: String) -> Result<(), AuthError> {
        self.verify(password, self.dummy_hash.to_string()).await?;
        Ok(())
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            AuthError::PasswordHash
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(8, 1).unwrap()
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("secret").is_ok());
        assert!(validate_password(&"x".repeat(128)).is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
        // Characters, not bytes
        assert!(validate_password("ñandú").is_err());
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(PasswordHasher::new(0, 1).is_err());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("secret1".to_string()).await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(hasher.verify("secret1".to_string(), hash.clone()).await.unwrap());
        assert!(!hasher.verify("secret2".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_different_salt() {
        let hasher = hasher();
        let a = hasher.hash("secret1".to_string()).await.unwrap();
        let b = hasher.hash("secret1".to_string()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        let hasher = hasher();
        assert!(!hasher.verify("secret1".to_string(), "plaintext".to_string()).await.unwrap());
        hasher.verify_dummy("anything".to_string()).await.unwrap();
    }
}
