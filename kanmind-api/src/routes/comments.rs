/// Comment endpoints (authenticated), scoped to the task in the path
///
/// # Endpoints
///
/// - `GET /tasks/{task_id}/comments/` - oldest first (owner or member of the board)
/// - `POST /tasks/{task_id}/comments/` - author is the caller (owner or member, 201)
/// - `DELETE /tasks/{task_id}/comments/{comment_id}/` - author only (204)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{parse_body, AppJson, AppPath},
    routes::tasks::load_task,
    schemas::comment::{CommentResponse, CreateCommentRequest},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kanmind_shared::{
    auth::{
        authorization::{require, Operation, Resource},
        middleware::AuthContext,
    },
    models::comment::{Comment, CreateComment},
};
use uuid::Uuid;

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let (_, access) = load_task(&state.db, task_id).await?;
    require(
        auth.user_id,
        Operation::Read,
        &Resource::Comment { board: &access, author_id: None },
    )?;

    let comments = Comment::list_by_task(&state.db, task_id).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(body): AppJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let (_, access) = load_task(&state.db, task_id).await?;
    require(
        auth.user_id,
        Operation::Create,
        &Resource::Comment { board: &access, author_id: None },
    )?;

    let mut errors = FieldErrors::new();
    let req: CreateCommentRequest = parse_body(body, &mut errors)?;
    errors.into_result()?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id,
            author_id: auth.user_id,
            content: req.content,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, comment_id = %comment.comment.id, "Comment created");

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath((task_id, comment_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let (_, access) = load_task(&state.db, task_id).await?;

    let comment = Comment::find_by_id(&state.db, comment_id)
        .await?
        .filter(|c| c.task_id == task_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    require(
        auth.user_id,
        Operation::Delete,
        &Resource::Comment { board: &access, author_id: Some(comment.author_id) },
    )?;

    if !Comment::delete(&state.db, comment_id).await? {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, comment_id = %comment_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
