/// Bearer token authentication for Axum
///
/// [`token_auth`] reads `Authorization: Bearer <token>`, resolves the token
/// to an active user and inserts an [`AuthContext`] into the request
/// extensions. Handlers take the caller explicitly:
///
/// ```
/// use axum::Extension;
/// use kanmind_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use kanmind_shared::auth::middleware::token_auth;
/// use sqlx::PgPool;
///
/// fn protected(pool: PgPool) -> Router {
///     Router::new()
///         .route("/boards/", get(|| async { "OK" }))
///         .layer(middleware::from_fn_with_state(pool, token_auth))
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::token::validate_token_format;
use crate::models::auth_token::AuthToken;

/// The authenticated caller, added to request extensions by [`token_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthError::MissingCredentials | AuthError::InvalidFormat(_) | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "Token lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": code, "message": message }))).into_response()
    }
}

/// Extracts the raw token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if !validate_token_format(token) {
        return Err(AuthError::InvalidToken);
    }

    Ok(token)
}

/// Resolves the request's bearer token to an active user.
pub async fn authenticate(pool: &PgPool, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let user_id = AuthToken::authenticate(pool, token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(AuthContext { user_id })
}

/// Middleware rejecting unauthenticated requests with 401.
pub async fn token_auth(
    State(pool): State<PgPool>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = authenticate(&pool, req.headers()).await?;

    tracing::Span::current().record("user_id", tracing::field::display(context.user_id));
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
