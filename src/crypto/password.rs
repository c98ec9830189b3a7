use pbkdf2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use pbkdf2::{Params, Pbkdf2};

use super::PasswordError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Hash a password into a self-describing PHC string
/// (`$pbkdf2-sha256$i=…,l=32$salt$hash`) with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, PasswordError> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    let params = Params {
        rounds: iterations,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, salt.as_salt())
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. The iteration count is
/// read from the hash, so older hashes keep verifying after a config change.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

/// `hash_password` on the blocking pool; PBKDF2 at full strength takes
/// long enough to stall an async worker.
pub async fn hash_password_blocking(
    password: String,
    iterations: u32,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await?
}

pub async fn verify_password_blocking(
    password: String,
    stored: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn hash_is_phc_string_and_not_plaintext() {
        let hash = hash_password("s3cret", TEST_ITERATIONS).unwrap();
        assert!(hash.starts_with("$pbkdf2-sha256$"));
        assert!(hash.contains("i=1000"));
        assert!(!hash.contains("s3cret"));
    }

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("s3cret", TEST_ITERATIONS).unwrap();
        assert!(verify_password("s3cret", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("s3cret", TEST_ITERATIONS).unwrap();
        assert!(!verify_password("S3cret", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let h1 = hash_password("s3cret", TEST_ITERATIONS).unwrap();
        let h2 = hash_password("s3cret", TEST_ITERATIONS).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn verification_uses_iterations_from_hash() {
        let hash = hash_password("s3cret", 2_000).unwrap();
        assert!(hash.contains("i=2000"));
        assert!(verify_password("s3cret", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("s3cret", "plaintext-password"),
            Err(PasswordError::MalformedHash(_))
        ));
    }

    #[tokio::test]
    async fn blocking_variants_round_trip() {
        let hash = hash_password_blocking("s3cret".into(), TEST_ITERATIONS)
            .await
            .unwrap();
        assert!(verify_password_blocking("s3cret".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("nope".into(), hash).await.unwrap());
    }
}
