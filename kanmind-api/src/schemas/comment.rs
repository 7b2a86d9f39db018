/// Comment shapes. Author, task and timestamp are always server-assigned.

use chrono::{DateTime, Utc};
use kanmind_shared::models::comment::CommentWithAuthor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{FromFields, Fields};

/// `POST /tasks/{task_id}/comments/`. Content is trimmed.
#[derive(Debug, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub content: String,
}

impl FromFields for CreateCommentRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            content: fields.text("content"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,

    /// Author's display name
    pub author: String,

    pub content: String,
    pub task: Uuid,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.comment.id,
            created_at: row.comment.created_at,
            author: row.author_fullname,
            content: row.comment.content,
            task: row.comment.task_id,
        }
    }
}
