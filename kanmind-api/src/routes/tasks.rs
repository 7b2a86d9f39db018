/// Task endpoints (authenticated)
///
/// # Endpoints
///
/// - `GET /tasks/` - tasks on boards the caller owns or is a member of
/// - `POST /tasks/` - create on the board named by `board` (owner or member, 201)
/// - `GET /tasks/{task_id}/` - detail (owner or member of the task's board)
/// - `PATCH /tasks/{task_id}/` - partial update; `board` is ignored
/// - `DELETE /tasks/{task_id}/` - task creator or board owner (204)
/// - `GET /tasks/assigned-to-me/` - tasks assigned to the caller
/// - `GET /tasks/reviewing/` - tasks the caller reviews
///
/// On create the board is resolved before the rest of the payload is looked
/// at: a missing board is a 404 and a board the caller cannot use is a 403,
/// whatever else the body contains.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{parse_body, AppJson, AppPath},
    routes::boards::load_access,
    schemas::task::{CreateTaskRequest, TaskResponse, UpdateTaskRequest},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kanmind_shared::{
    auth::{
        authorization::{require, BoardAccess, Operation, Resource},
        middleware::AuthContext,
    },
    models::{
        task::{Task, TaskWithCounts},
        user::{User, UserDirectory},
    },
};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = Task::list_accessible(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(body): AppJson<Value>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let board_id = board_reference(&body)?;
    let access = load_access(&state.db, board_id).await?;
    require(
        auth.user_id,
        Operation::Create,
        &Resource::Task { board: &access, creator_id: None },
    )?;

    let mut errors = FieldErrors::new();
    let req: CreateTaskRequest = parse_body(body, &mut errors)?;
    check_user_refs(&state.db, &req.user_refs(), &mut errors).await?;
    errors.into_result()?;

    let task = Task::create(&state.db, req.into_create(auth.user_id)).await?;

    tracing::info!(user_id = %auth.user_id, board_id = %board_id, task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(render_task(&state.db, task.id).await?)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let (task, access) = load_task(&state.db, task_id).await?;
    require(auth.user_id, Operation::Read, &task_resource(&task, &access))?;

    Ok(Json(render_task(&state.db, task_id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(body): AppJson<Value>,
) -> ApiResult<Json<TaskResponse>> {
    let (task, access) = load_task(&state.db, task_id).await?;
    require(auth.user_id, Operation::Update, &task_resource(&task, &access))?;

    let mut errors = FieldErrors::new();
    let req: UpdateTaskRequest = parse_body(body, &mut errors)?;
    check_user_refs(&state.db, &req.user_refs(), &mut errors).await?;
    errors.into_result()?;

    Task::update(&state.db, task_id, req.into_update())
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Task updated");

    Ok(Json(render_task(&state.db, task_id).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    let (task, access) = load_task(&state.db, task_id).await?;
    require(auth.user_id, Operation::Delete, &task_resource(&task, &access))?;

    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = Task::list_assigned_to(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

pub async fn reviewing(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = Task::list_reviewing(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

/// A task and its board's access snapshot, or 404.
pub(crate) async fn load_task(pool: &PgPool, task_id: Uuid) -> ApiResult<(Task, BoardAccess)> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let access = load_access(pool, task.board_id).await?;
    Ok((task, access))
}

fn task_resource<'a>(task: &Task, access: &'a BoardAccess) -> Resource<'a> {
    Resource::Task {
        board: access,
        creator_id: Some(task.created_by),
    }
}

/// Renders task rows, loading every referenced user in one query.
pub(crate) async fn render_tasks(pool: &PgPool, rows: Vec<TaskWithCounts>) -> ApiResult<Vec<TaskResponse>> {
    let users = UserDirectory::load(pool, rows.iter().flat_map(|row| row.task.user_ids())).await?;

    rows.into_iter()
        .map(|row| {
            let task_id = row.task.id;
            TaskResponse::build(row, &users)
                .ok_or_else(|| ApiError::InternalError(format!("Creator of task {} not found", task_id)))
        })
        .collect()
}

async fn render_task(pool: &PgPool, task_id: Uuid) -> ApiResult<TaskResponse> {
    let row = Task::find_with_counts(pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    render_tasks(pool, vec![row])
        .await?
        .pop()
        .ok_or_else(|| ApiError::InternalError(format!("Task {} did not render", task_id)))
}

/// The `board` id from a create body, checked before anything else in it.
fn board_reference(body: &Value) -> ApiResult<Uuid> {
    match body.get("board") {
        None | Some(Value::Null) => Err(ApiError::field("board", "This field is required.")),
        Some(Value::String(raw)) => {
            Uuid::parse_str(raw).map_err(|_| ApiError::field("board", "Must be a valid UUID."))
        }
        Some(_) => Err(ApiError::field("board", "Must be a valid UUID.")),
    }
}

/// Every set user reference must name an existing user.
async fn check_user_refs(
    pool: &PgPool,
    refs: &[(&'static str, Option<Uuid>)],
    errors: &mut FieldErrors,
) -> ApiResult<()> {
    let ids: Vec<Uuid> = refs.iter().filter_map(|(_, id)| *id).collect();
    let missing = User::missing_ids(pool, &ids).await?;

    for (field, id) in refs {
        if let Some(id) = id {
            if missing.contains(id) {
                errors.add(*field, format!("Unknown user id: {}", id));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_board_reference() {
        let id = Uuid::new_v4();
        assert_eq!(board_reference(&json!({ "board": id })).unwrap(), id);

        for body in [json!({}), json!({ "board": null }), json!({ "board": "abc" }), json!({ "board": 7 })] {
            let err = board_reference(&body).unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(ref d) if d[0].field == "board"));
        }
    }
}
