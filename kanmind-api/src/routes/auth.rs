/// Registration and login
///
/// Both endpoints are public and answer with a fresh bearer token:
///
/// ```json
/// { "token": "kmt_...", "fullname": "Jane Doe", "email": "jane@example.com", "user_id": "uuid" }
/// ```
///
/// # Endpoints
///
/// - `POST /registration/` - 201, or 400 with field errors
/// - `POST /login/` - 200, or 400 "Invalid credentials"

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{parse_body, AppJson, ValidJson},
    schemas::user::{AuthResponse, LoginRequest, RegisterRequest},
};
use axum::{extract::State, http::StatusCode, Json};
use kanmind_shared::{
    auth::password,
    models::{
        auth_token::AuthToken,
        user::{CreateUser, User},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Registers a user and issues a token.
///
/// All field problems, including an email that is already registered, are
/// reported together.
pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let mut errors = FieldErrors::new();
    let req: RegisterRequest = parse_body(body, &mut errors)?;
    req.check_passwords(&mut errors);

    if !errors.has("email") && User::email_exists(&state.db, &req.email).await? {
        errors.add("email", "A user with this email already exists.");
    }
    errors.into_result()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            fullname: req.fullname,
            password_hash,
        },
    )
    .await?;

    let (_, token) = AuthToken::issue(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &user))))
}

/// Authenticates by email and password and issues a token.
///
/// Unknown email, wrong password and inactive account all give the same
/// error after the same Argon2 work.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        password::verify_dummy(&req.password)?;
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid || !user.is_active {
        tracing::warn!(user_id = %user.id, "Login rejected");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let (_, token) = AuthToken::issue(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new(token, &user)))
}
