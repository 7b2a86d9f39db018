/// Task shapes
///
/// Writes take user references as ids (`assignee_id`, `reviewer_id`); reads
/// render them as public users. `board` and `created_by` are fixed at
/// creation: the update request has no field for either, so a client
/// sending them has no effect.

use chrono::NaiveDate;
use kanmind_shared::models::task::{CreateTask, TaskPriority, TaskStatus, TaskWithCounts, UpdateTask};
use kanmind_shared::models::user::{PublicUser, UserDirectory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{FromFields, Fields};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub board: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<PublicUser>,
    pub reviewer: Option<PublicUser>,
    pub created_by: PublicUser,
    pub due_date: Option<NaiveDate>,
    pub comments_count: i64,
}

impl TaskResponse {
    /// Returns `None` when the creator is missing from `users`.
    pub fn build(row: TaskWithCounts, users: &UserDirectory) -> Option<Self> {
        let task = row.task;
        let created_by = users.get(task.created_by)?.clone();

        Some(Self {
            id: task.id,
            board: task.board_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assignee: users.resolve(task.assignee_id),
            reviewer: users.resolve(task.reviewer_id),
            created_by,
            due_date: task.due_date,
            comments_count: row.comments_count,
        })
    }
}

/// `POST /tasks/`. The board id is read and checked before this shape is
/// parsed. Title and description are trimmed.
#[derive(Debug, Validate)]
pub struct CreateTaskRequest {
    pub board: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: String,

    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

impl FromFields for CreateTaskRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            board: fields.required("board").unwrap_or_default(),
            title: fields.text("title"),
            description: fields.optional_text("description").unwrap_or_default(),
            status: fields.optional("status").unwrap_or_default(),
            priority: fields.optional("priority"),
            assignee_id: fields.optional("assignee_id"),
            reviewer_id: fields.optional("reviewer_id"),
            due_date: fields.optional("due_date"),
        }
    }
}

impl CreateTaskRequest {
    /// User references by field name
    pub fn user_refs(&self) -> [(&'static str, Option<Uuid>); 2] {
        [("assignee_id", self.assignee_id), ("reviewer_id", self.reviewer_id)]
    }

    pub fn into_create(self, created_by: Uuid) -> CreateTask {
        CreateTask {
            board_id: self.board,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assignee_id: self.assignee_id,
            reviewer_id: self.reviewer_id,
            created_by,
        }
    }
}

/// `PATCH /tasks/{task_id}/`. Absent fields are left alone; `null` clears
/// the nullable ones.
#[derive(Debug, Default, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Option<TaskPriority>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub reviewer_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl FromFields for UpdateTaskRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            title: fields.optional_text("title"),
            description: fields.optional_text("description"),
            status: fields.optional("status"),
            priority: fields.nullable("priority"),
            assignee_id: fields.nullable("assignee_id"),
            reviewer_id: fields.nullable("reviewer_id"),
            due_date: fields.nullable("due_date"),
        }
    }
}

impl UpdateTaskRequest {
    /// User references being set (not cleared), by field name
    pub fn user_refs(&self) -> [(&'static str, Option<Uuid>); 2] {
        [
            ("assignee_id", self.assignee_id.flatten()),
            ("reviewer_id", self.reviewer_id.flatten()),
        ]
    }

    pub fn into_update(self) -> UpdateTask {
        UpdateTask {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assignee_id: self.assignee_id,
            reviewer_id: self.reviewer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kanmind_shared::models::task::Task;
    use crate::error::FieldErrors;
    use crate::extract::parse_body;
    use kanmind_shared::models::user::User;
    use serde_json::{json, Value};

    fn read<T: FromFields + Validate>(body: Value) -> (T, FieldErrors) {
        let mut errors = FieldErrors::new();
        let value = parse_body(body, &mut errors).unwrap();
        (value, errors)
    }

    fn user(fullname: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", fullname.to_lowercase().replace(' ', ".")),
            fullname: fullname.to_string(),
            password_hash: "$argon2id$".to_string(),
            is_active: true,
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    fn row(created_by: Uuid, assignee_id: Option<Uuid>) -> TaskWithCounts {
        TaskWithCounts {
            task: Task {
                id: Uuid::new_v4(),
                board_id: Uuid::new_v4(),
                title: "Write docs".to_string(),
                description: String::new(),
                status: TaskStatus::InProgress,
                priority: Some(TaskPriority::High),
                due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
                assignee_id,
                reviewer_id: None,
                created_by,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            comments_count: 2,
        }
    }

    #[test]
    fn test_task_response_shape() {
        let creator = user("Alice Smith");
        let assignee = user("Bob Jones");
        let users = UserDirectory::from_users(vec![creator.clone(), assignee.clone()]);

        let response = TaskResponse::build(row(creator.id, Some(assignee.id)), &users).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["due_date"], "2025-03-01");
        assert_eq!(json["assignee"]["fullname"], "Bob Jones");
        assert!(json["reviewer"].is_null());
        assert_eq!(json["created_by"]["id"], json!(creator.id));
        assert_eq!(json["comments_count"], 2);
    }

    #[test]
    fn test_task_response_requires_creator() {
        assert!(TaskResponse::build(row(Uuid::new_v4(), None), &UserDirectory::default()).is_none());
    }

    #[test]
    fn test_create_task_request_defaults() {
        let board = Uuid::new_v4();
        let (req, errors) = read::<CreateTaskRequest>(
            json!({ "board": board, "title": " t ", "created_by": Uuid::new_v4() }),
        );

        assert!(errors.is_empty());
        assert_eq!(req.title, "t");
        assert_eq!(req.description, "");
        assert_eq!(req.status, TaskStatus::ToDo);
        assert!(req.priority.is_none());
        assert_eq!(req.user_refs(), [("assignee_id", None), ("reviewer_id", None)]);

        let creator = Uuid::new_v4();
        let create = req.into_create(creator);
        assert_eq!(create.board_id, board);
        assert_eq!(create.created_by, creator);
    }

    #[test]
    fn test_create_task_request_collects_field_errors() {
        let (_, errors) = read::<CreateTaskRequest>(json!({
            "board": Uuid::new_v4(),
            "title": "   ",
            "status": "blocked",
            "priority": "urgent",
            "due_date": "tomorrow",
        }));

        for field in ["title", "status", "priority", "due_date"] {
            assert!(errors.has(field), "{field} should be reported");
        }
        assert!(!errors.has("board"));
    }

    #[test]
    fn test_update_task_request_ignores_board_and_clears() {
        let assignee = Uuid::new_v4();
        let (req, errors) = read::<UpdateTaskRequest>(json!({
            "board": Uuid::new_v4(),
            "assignee_id": assignee,
            "reviewer_id": null
        }));
        assert!(errors.is_empty());

        assert_eq!(req.user_refs(), [("assignee_id", Some(assignee)), ("reviewer_id", None)]);

        let update = req.into_update();
        assert_eq!(update.assignee_id, Some(Some(assignee)));
        assert_eq!(update.reviewer_id, Some(None));
        assert_eq!(update.priority, None);
        assert!(update.title.is_none());
    }

    #[test]
    fn test_update_task_request_rejects_blank_title() {
        let (_, errors) = read::<UpdateTaskRequest>(json!({ "title": "  ", "status": "later" }));
        assert!(errors.has("title"));
        assert!(errors.has("status"));
    }
}
