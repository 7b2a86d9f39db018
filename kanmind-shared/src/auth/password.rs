/// Password hashing with Argon2id
///
/// Hashes are PHC strings, so the parameters and salt travel with the hash
/// and verification needs nothing else.
///
/// Parameters: 64 MiB memory, 3 passes, 4 lanes, 32-byte output.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse")?;
/// assert!(verify_password("correct horse", &hash)?);
/// assert!(!verify_password("wrong horse", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};
use std::sync::OnceLock;

/// Hash checked when no account matches, built once with the same parameters
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash in constant time.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Runs a full verification against a fixed hash and always reports a
/// mismatch. Used for unknown emails: the Argon2 work matches a wrong
/// password.
pub fn verify_dummy(password: &str) -> Result<bool, PasswordError> {
    verify_password(password, dummy_hash()?)?;
    Ok(false)
}

fn dummy_hash() -> Result<&'static str, PasswordError> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }

    let hash = hash_password("kanmind-no-such-account")?;
    Ok(DUMMY_HASH.get_or_init(|| hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("s3cret").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536,t=3,p=4"));
    }

    #[test]
    fn test_hash_password_salts_differ() {
        let a = hash_password("same").expect("Hash should succeed");
        let b = hash_password("same").expect("Hash should succeed");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("right").expect("Hash should succeed");

        assert!(verify_password("right", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "not-a-hash"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_verify_dummy_never_matches() {
        assert!(!verify_dummy("kanmind-no-such-account").unwrap());
        assert!(!verify_dummy("anything").unwrap());
    }

    #[test]
    fn test_dummy_hash_uses_login_parameters() {
        let hash = dummy_hash().unwrap();

        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
        assert_eq!(hash, dummy_hash().unwrap());
    }
}
