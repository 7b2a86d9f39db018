/// Comment model and database operations
///
/// Comments hang off a task and disappear with it. Both `task_id` and
/// `author_id` are assigned by the server when the comment is written.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment joined with its author's display name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    #[sqlx(flatten)]
    pub comment: Comment,

    pub author_fullname: String,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

const COMMENT_WITH_AUTHOR_SELECT: &str = r#"
    SELECT c.id, c.task_id, c.author_id, c.content, c.created_at,
           u.fullname AS author_fullname
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

impl Comment {
    /// Inserts the comment and returns it with the author's name attached.
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<CommentWithAuthor, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (task_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, task_id, author_id, content, created_at
            )
            SELECT i.id, i.task_id, i.author_id, i.content, i.created_at,
                   u.fullname AS author_fullname
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(data.task_id)
        .bind(data.author_id)
        .bind(data.content)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, task_id, author_id, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Comments on a task, oldest first.
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let query = format!("{COMMENT_WITH_AUTHOR_SELECT} WHERE c.task_id = $1 ORDER BY c.created_at, c.id");

        sqlx::query_as::<_, CommentWithAuthor>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
