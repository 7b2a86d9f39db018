/// Authorization rules
///
/// Every decision is a pure function of the acting user, the operation and a
/// snapshot of the resource's relationships. Handlers load the snapshot
/// (see `Board::access`) and call [`require`] before touching anything else.
///
/// # Rules
///
/// | Resource | Read / Update        | Create               | Delete                     |
/// |----------|----------------------|----------------------|----------------------------|
/// | Board    | owner or member      | any user, as owner   | owner                      |
/// | Task     | owner or member      | owner or member      | task creator or board owner|
/// | Comment  | owner or member (read) | owner or member    | comment author             |
///
/// Comments cannot be updated. Anything not listed is denied.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::authorization::{can, BoardAccess, Operation, Resource};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let member = Uuid::new_v4();
/// let board = BoardAccess::new(owner, vec![member]);
///
/// assert!(can(member, Operation::Read, &Resource::Board(&board)));
/// assert!(!can(member, Operation::Delete, &Resource::Board(&board)));
/// ```

use uuid::Uuid;

/// Owner and member ids of one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardAccess {
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl BoardAccess {
    pub fn new(owner_id: Uuid, member_ids: Vec<Uuid>) -> Self {
        Self { owner_id, member_ids }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Owner or member
    pub fn has_access(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.is_member(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// The resource an operation targets, with the relationships the rules need.
///
/// For task and comment creates the creator/author is not known yet and is
/// `None`. A board create passes the board as it would be stored.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Board(&'a BoardAccess),
    Task {
        board: &'a BoardAccess,
        creator_id: Option<Uuid>,
    },
    Comment {
        board: &'a BoardAccess,
        author_id: Option<Uuid>,
    },
}

impl Resource<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Board(_) => "board",
            Resource::Task { .. } => "task",
            Resource::Comment { .. } => "comment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("You do not have permission to {operation} this {resource}")]
    Forbidden {
        operation: &'static str,
        resource: &'static str,
    },
}

/// Whether `actor` may perform `operation` on `resource`.
pub fn can(actor: Uuid, operation: Operation, resource: &Resource<'_>) -> bool {
    match (resource, operation) {
        (Resource::Board(board), Operation::Read | Operation::Update) => board.has_access(actor),
        (Resource::Board(board), Operation::Delete) => board.is_owner(actor),
        (Resource::Board(board), Operation::Create) => board.is_owner(actor),

        (Resource::Task { board, .. }, Operation::Read | Operation::Create | Operation::Update) => {
            board.has_access(actor)
        }
        (Resource::Task { board, creator_id }, Operation::Delete) => {
            board.is_owner(actor) || *creator_id == Some(actor)
        }

        (Resource::Comment { board, .. }, Operation::Read | Operation::Create) => {
            board.has_access(actor)
        }
        (Resource::Comment { author_id, .. }, Operation::Delete) => *author_id == Some(actor),
        (Resource::Comment { .. }, Operation::Update) => false,
    }
}

/// Like [`can`], but as a `Result` for use with `?`.
pub fn require(actor: Uuid, operation: Operation, resource: &Resource<'_>) -> Result<(), AuthzError> {
    if can(actor, operation, resource) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %actor,
            operation = operation.as_str(),
            resource = resource.kind(),
            "Access denied"
        );
        Err(AuthzError::Forbidden {
            operation: operation.as_str(),
            resource: resource.kind(),
        })
    }
}
