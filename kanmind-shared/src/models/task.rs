/// Task model and database operations
///
/// A task belongs to exactly one board for its whole life; `board_id` and
/// `created_by` are written once at insert and no update path touches them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to-do', 'in-progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'to-do',
///     priority task_priority,
///     due_date DATE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     reviewer_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     board_id,
///     title: "Write release notes".to_string(),
///     description: String::new(),
///     status: TaskStatus::ToDo,
///     priority: Some(TaskPriority::High),
///     due_date: None,
///     assignee_id: Some(user_id),
///     reviewer_id: None,
///     created_by: user_id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Workflow column a task sits in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[sqlx(rename = "to-do")]
    #[serde(rename = "to-do")]
    ToDo,

    #[sqlx(rename = "in-progress")]
    #[serde(rename = "in-progress")]
    InProgress,

    #[sqlx(rename = "review")]
    #[serde(rename = "review")]
    Review,

    #[sqlx(rename = "done")]
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning board, immutable after creation
    pub board_id: Uuid,

    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,

    /// The user who created the task, immutable
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Ids of every user this task references
    pub fn user_ids(&self) -> impl Iterator<Item = Uuid> {
        [Some(self.created_by), self.assignee_id, self.reviewer_id]
            .into_iter()
            .flatten()
    }
}

/// A task plus its comment count, computed by the query
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskWithCounts {
    #[sqlx(flatten)]
    pub task: Task,

    pub comments_count: i64,
}

/// Input for creating a task. `created_by` comes from the authenticated
/// caller, never from the request body.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub board_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Partial update. Outer `None` leaves a field alone; `Some(None)` clears a
/// nullable field. Board and creator are fixed at insert and have no field here.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Option<TaskPriority>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub reviewer_id: Option<Option<Uuid>>,
}

const TASK_COLUMNS: &str = "id, board_id, title, description, status, priority, due_date, \
     assignee_id, reviewer_id, created_by, created_at, updated_at";

const TASK_WITH_COUNTS_SELECT: &str = r#"
    SELECT t.id, t.board_id, t.title, t.description, t.status, t.priority, t.due_date,
           t.assignee_id, t.reviewer_id, t.created_by, t.created_at, t.updated_at,
           (SELECT COUNT(*) FROM comments c WHERE c.task_id = t.id) AS comments_count
    FROM tasks t
"#;

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (board_id, title, description, status, priority, due_date,
                               assignee_id, reviewer_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.board_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.assignee_id)
            .bind(data.reviewer_id)
            .bind(data.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_with_counts(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithCounts>, sqlx::Error> {
        let query = format!("{TASK_WITH_COUNTS_SELECT} WHERE t.id = $1");

        sqlx::query_as::<_, TaskWithCounts>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_board(
        pool: &PgPool,
        board_id: Uuid,
    ) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
        let query = format!("{TASK_WITH_COUNTS_SELECT} WHERE t.board_id = $1 ORDER BY t.created_at, t.id");

        sqlx::query_as::<_, TaskWithCounts>(&query)
            .bind(board_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks on every board the user owns or is a member of.
    pub async fn list_accessible(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
        let query = format!(
            r#"{TASK_WITH_COUNTS_SELECT}
            JOIN boards b ON b.id = t.board_id
            WHERE b.owner_id = $1
               OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1)
            ORDER BY t.created_at, t.id"#
        );

        sqlx::query_as::<_, TaskWithCounts>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks assigned to the user, across all boards.
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
        let query = format!("{TASK_WITH_COUNTS_SELECT} WHERE t.assignee_id = $1 ORDER BY t.created_at, t.id");

        sqlx::query_as::<_, TaskWithCounts>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks the user reviews, across all boards.
    pub async fn list_reviewing(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
        let query = format!("{TASK_WITH_COUNTS_SELECT} WHERE t.reviewer_id = $1 ORDER BY t.created_at, t.id");

        sqlx::query_as::<_, TaskWithCounts>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Applies a partial update and bumps `updated_at`. Returns `None` if the
    /// task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = data.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            query.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(reviewer_id) = data.reviewer_id {
            query.push(", reviewer_id = ").push_bind(reviewer_id);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        query.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Deletes the task and, by cascade, its comments.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
