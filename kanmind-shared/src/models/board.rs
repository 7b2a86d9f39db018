/// Board model and database operations
///
/// A board has exactly one owner and any number of members. The owner does
/// not need to be listed as a member. Deleting a board cascades to its tasks
/// and, through them, to their comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT boards_owner_title_key UNIQUE (owner_id, title)
/// );
///
/// CREATE TABLE board_members (
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::auth::authorization::BoardAccess;

/// Name of the unique constraint guarding (owner, title)
pub const OWNER_TITLE_CONSTRAINT: &str = "boards_owner_title_key";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Board {
    pub id: Uuid,
    pub title: String,

    /// Set at creation, never changed
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// List-view projection of a board. Every count is computed by the query
/// from the current rows; none of them is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub member_count: i64,
    pub ticket_count: i64,
    pub tasks_to_do_count: i64,
    pub tasks_high_prio_count: i64,
}

/// Input for creating a board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    pub title: String,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

/// Input for updating a board. `None` leaves the field untouched; a member
/// list replaces the current set.
#[derive(Debug, Clone, Default)]
pub struct UpdateBoard {
    pub title: Option<String>,
    pub member_ids: Option<Vec<Uuid>>,
}

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.owner_id,
           (SELECT COUNT(*) FROM board_members m WHERE m.board_id = b.id) AS member_count,
           (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id) AS ticket_count,
           (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id AND t.status = 'to-do') AS tasks_to_do_count,
           (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id AND t.priority = 'high') AS tasks_high_prio_count
    FROM boards b
"#;

impl Board {
    /// Inserts the board and its member rows in one transaction.
    pub async fn create(pool: &PgPool, data: CreateBoard) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (title, owner_id)
            VALUES ($1, $2)
            RETURNING id, title, owner_id, created_at
            "#,
        )
        .bind(&data.title)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_members(&mut tx, board.id, &data.member_ids).await?;

        tx.commit().await?;
        Ok(board)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            "SELECT id, title, owner_id, created_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Owner and member ids of a board, or `None` when the board is gone.
    pub async fn access(pool: &PgPool, id: Uuid) -> Result<Option<BoardAccess>, sqlx::Error> {
        let row: Option<(Uuid, Vec<Uuid>)> = sqlx::query_as(
            r#"
            SELECT b.owner_id,
                   COALESCE(array_agg(m.user_id) FILTER (WHERE m.user_id IS NOT NULL), '{}') AS member_ids
            FROM boards b
            LEFT JOIN board_members m ON m.board_id = b.id
            WHERE b.id = $1
            GROUP BY b.id
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(owner_id, member_ids)| BoardAccess::new(owner_id, member_ids)))
    }

    /// Member ids, ordered by registration time.
    pub async fn member_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT m.user_id
            FROM board_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.board_id = $1
            ORDER BY u.created_at, u.id
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Whether `owner_id` already owns a board called `title`, ignoring the
    /// board being updated.
    pub async fn title_taken(
        pool: &PgPool,
        owner_id: Uuid,
        title: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM boards
                WHERE owner_id = $1 AND title = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(exclude)
        .fetch_one(pool)
        .await
    }

    /// Applies a partial update. Returns `None` if the board does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBoard,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = COALESCE($2, title)
            WHERE id = $1
            RETURNING id, title, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(board) = board else {
            return Ok(None);
        };

        if let Some(member_ids) = data.member_ids {
            sqlx::query("DELETE FROM board_members WHERE board_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_members(&mut tx, id, &member_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(board))
    }

    /// Deletes the board; tasks and comments go with it.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Summaries of every board the user owns or is a member of, each once.
    pub async fn list_summaries_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<BoardSummary>, sqlx::Error> {
        let query = format!(
            r#"{SUMMARY_SELECT}
            WHERE b.owner_id = $1
               OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1)
            ORDER BY b.created_at, b.id"#
        );

        sqlx::query_as::<_, BoardSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn summary(pool: &PgPool, id: Uuid) -> Result<Option<BoardSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1");

        sqlx::query_as::<_, BoardSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    board_id: Uuid,
    member_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    if member_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO board_members (board_id, user_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(board_id)
    .bind(member_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
