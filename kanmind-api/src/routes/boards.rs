/// Board endpoints (authenticated)
///
/// # Endpoints
///
/// - `GET /boards/` - summaries of boards the caller owns or is a member of
/// - `POST /boards/` - create a board owned by the caller (201, summary)
/// - `GET /boards/{board_id}/` - detail view (owner or member)
/// - `PATCH /boards/{board_id}/` - update title and/or members (owner or member)
/// - `DELETE /boards/{board_id}/` - delete with tasks and comments (owner only, 204)
///
/// Titles are unique per owner; a duplicate is a 400 on `title`. Member ids
/// must name existing users.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{parse_body, AppJson, AppPath},
    routes::tasks::render_tasks,
    schemas::board::{dedup_ids, BoardDetailResponse, CreateBoardRequest, UpdateBoardRequest},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use kanmind_shared::{
    auth::{
        authorization::{require, BoardAccess, Operation, Resource},
        middleware::AuthContext,
    },
    models::{
        board::{Board, BoardSummary, CreateBoard, UpdateBoard},
        task::Task,
        user::{User, UserDirectory},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

const DUPLICATE_TITLE: &str = "This owner already has a board with this title.";

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    let boards = Board::list_summaries_for_user(&state.db, auth.user_id).await?;

    tracing::debug!(user_id = %auth.user_id, count = boards.len(), "Listed boards");

    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(body): AppJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    let mut errors = FieldErrors::new();
    let req: CreateBoardRequest = parse_body(body, &mut errors)?;
    let member_ids = dedup_ids(req.members);
    require(
        auth.user_id,
        Operation::Create,
        &Resource::Board(&BoardAccess::new(auth.user_id, member_ids.clone())),
    )?;

    if !errors.has("title") && Board::title_taken(&state.db, auth.user_id, &req.title, None).await? {
        errors.add("title", DUPLICATE_TITLE);
    }
    check_members(&state.db, &member_ids, &mut errors).await?;
    errors.into_result()?;

    let board = Board::create(
        &state.db,
        CreateBoard {
            title: req.title,
            owner_id: auth.user_id,
            member_ids,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, board_id = %board.id, "Board created");

    let summary = Board::summary(&state.db, board.id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("Board {} vanished after insert", board.id)))?;

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<BoardDetailResponse>> {
    let access = load_access(&state.db, board_id).await?;
    require(auth.user_id, Operation::Read, &Resource::Board(&access))?;

    Ok(Json(board_detail(&state.db, board_id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
    AppJson(body): AppJson<serde_json::Value>,
) -> ApiResult<Json<BoardDetailResponse>> {
    let access = load_access(&state.db, board_id).await?;
    require(auth.user_id, Operation::Update, &Resource::Board(&access))?;

    let mut errors = FieldErrors::new();
    let req: UpdateBoardRequest = parse_body(body, &mut errors)?;
    let member_ids = req.members.map(dedup_ids);

    if let Some(title) = &req.title {
        // Uniqueness is per owner, whoever is editing
        if !errors.has("title") && Board::title_taken(&state.db, access.owner_id, title, Some(board_id)).await? {
            errors.add("title", DUPLICATE_TITLE);
        }
    }
    if let Some(ids) = &member_ids {
        check_members(&state.db, ids, &mut errors).await?;
    }
    errors.into_result()?;

    Board::update(
        &state.db,
        board_id,
        UpdateBoard {
            title: req.title,
            member_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, board_id = %board_id, "Board updated");

    Ok(Json(board_detail(&state.db, board_id).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let access = load_access(&state.db, board_id).await?;
    require(auth.user_id, Operation::Delete, &Resource::Board(&access))?;

    if !Board::delete(&state.db, board_id).await? {
        return Err(ApiError::NotFound("Board not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, board_id = %board_id, "Board deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Owner and members of a board, or 404.
pub(crate) async fn load_access(pool: &PgPool, board_id: Uuid) -> ApiResult<BoardAccess> {
    Board::access(pool, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))
}

async fn board_detail(pool: &PgPool, board_id: Uuid) -> ApiResult<BoardDetailResponse> {
    let board = Board::find_by_id(pool, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    let member_ids = Board::member_ids(pool, board_id).await?;
    let tasks = render_tasks(pool, Task::list_by_board(pool, board_id).await?).await?;

    let users = UserDirectory::load(
        pool,
        member_ids.iter().copied().chain(std::iter::once(board.owner_id)),
    )
    .await?;

    BoardDetailResponse::build(board, &member_ids, tasks, &users)
        .ok_or_else(|| ApiError::InternalError(format!("Owner of board {} not found", board_id)))
}

async fn check_members(pool: &PgPool, member_ids: &[Uuid], errors: &mut FieldErrors) -> ApiResult<()> {
    let missing = User::missing_ids(pool, member_ids).await?;
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(Uuid::to_string).collect();
        errors.add("members", format!("Unknown user id(s): {}", ids.join(", ")));
    }

    Ok(())
}
