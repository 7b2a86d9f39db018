/// Opaque bearer token primitives
///
/// # Format
///
/// `kmt_` followed by 40 base62 characters (44 chars total). The random part
/// comes from the thread-local CSPRNG, giving about 238 bits of entropy.
///
/// Only the SHA-256 digest of a token is stored (see
/// `models::auth_token`), so a leaked table does not leak usable tokens.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::token::{generate_token, hash_token, validate_token_format};
///
/// let (token, digest) = generate_token();
/// assert!(validate_token_format(&token));
/// assert_eq!(hash_token(&token), digest);
/// ```

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "kmt_";

const TOKEN_RANDOM_LENGTH: usize = 40;

/// Total length of a token (prefix + random part)
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Generates a fresh token. Returns `(plaintext, sha256_hex)`.
pub fn generate_token() -> (String, String) {
    let random_part: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LENGTH)
        .map(char::from)
        .collect();

    let token = format!("{TOKEN_PREFIX}{random_part}");
    let digest = hash_token(&token);

    (token, digest)
}

/// Hex-encoded SHA-256 of the token (64 chars).
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check run before any store lookup.
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token.starts_with(TOKEN_PREFIX)
        && token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
}
