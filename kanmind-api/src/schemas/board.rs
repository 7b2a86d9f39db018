/// Board shapes
///
/// The list view uses `BoardSummary` from the model layer as is; its counts
/// are computed by the query. The detail view expands owner and members into
/// public users and nests the board's tasks.

use kanmind_shared::models::board::Board;
use kanmind_shared::models::user::{PublicUser, UserDirectory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::task::TaskResponse;
use super::{FromFields, Fields};

/// `POST /boards/`. The title is trimmed before it is checked or stored.
#[derive(Debug, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,

    /// Member user ids; write-only
    pub members: Vec<Uuid>,
}

impl FromFields for CreateBoardRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            title: fields.text("title"),
            members: fields.optional("members").unwrap_or_default(),
        }
    }
}

/// `PATCH /boards/{board_id}/`. A member list replaces the current set.
#[derive(Debug, Default, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: Option<String>,

    pub members: Option<Vec<Uuid>>,
}

impl FromFields for UpdateBoardRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            title: fields.optional_text("title"),
            members: fields.optional("members"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub owner: PublicUser,
    pub members: Vec<PublicUser>,
    pub tasks: Vec<TaskResponse>,
}

impl BoardDetailResponse {
    /// Builds the detail view. `members` keeps the order of `member_ids`;
    /// ids missing from the directory are skipped. Returns `None` when the
    /// owner cannot be resolved.
    pub fn build(
        board: Board,
        member_ids: &[Uuid],
        tasks: Vec<TaskResponse>,
        users: &UserDirectory,
    ) -> Option<Self> {
        let owner = users.get(board.owner_id)?.clone();
        let members = member_ids
            .iter()
            .filter_map(|id| users.get(*id).cloned())
            .collect();

        Some(Self {
            id: board.id,
            title: board.title,
            owner,
            members,
            tasks,
        })
    }
}

/// Removes repeated ids, keeping first occurrences.
pub fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
