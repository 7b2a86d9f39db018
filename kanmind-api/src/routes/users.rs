/// User directory endpoints (authenticated)
///
/// - `GET /users/` - every user, public fields only
/// - `GET /email-check/?email=` - the user with that email (any case), or 404

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidQuery,
    schemas::user::EmailCheckQuery,
};
use axum::{extract::State, Extension, Json};
use kanmind_shared::{
    auth::middleware::AuthContext,
    models::user::{PublicUser, User},
};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    tracing::debug!(user_id = %auth.user_id, "Listing users");

    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

pub async fn email_check(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidQuery(query): ValidQuery<EmailCheckQuery>,
) -> ApiResult<Json<PublicUser>> {
    tracing::debug!(user_id = %auth.user_id, "Email lookup");

    let user = User::find_by_email(&state.db, &query.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user with this email exists".to_string()))?;

    Ok(Json(PublicUser::from(user)))
}
