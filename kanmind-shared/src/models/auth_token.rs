/// Bearer token storage
///
/// Tokens are stored as SHA-256 digests; the plaintext is handed to the
/// client once, at registration or login, and cannot be recovered.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     token_hash VARCHAR(64) PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_used_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Issues a new token for `user_id`. Returns the stored row and the
    /// plaintext token, which is never persisted.
    pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<(Self, String), sqlx::Error> {
        let (plaintext, token_hash) = token::generate_token();

        let row = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (token_hash, user_id)
            VALUES ($1, $2)
            RETURNING token_hash, user_id, created_at, last_used_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok((row, plaintext))
    }

    /// Resolves a plaintext token to the id of an active user and records the
    /// use. Unknown tokens and tokens of inactive users yield `None`.
    pub async fn authenticate(pool: &PgPool, plaintext: &str) -> Result<Option<Uuid>, sqlx::Error> {
        let token_hash = token::hash_token(plaintext);

        sqlx::query_scalar(
            r#"
            UPDATE auth_tokens t
            SET last_used_at = NOW()
            FROM users u
            WHERE t.token_hash = $1 AND u.id = t.user_id AND u.is_active
            RETURNING t.user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }
}
