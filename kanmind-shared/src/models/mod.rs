/// Database models for KanMind
///
/// - `user`: accounts and their public representation
/// - `auth_token`: opaque bearer tokens (stored hashed)
/// - `board`: boards, membership and list-view summaries
/// - `task`: tasks with status/priority and comment counts
/// - `comment`: task comments
///
/// Cascades: deleting a board removes its tasks, deleting a task removes its
/// comments.

pub mod auth_token;
pub mod board;
pub mod comment;
pub mod task;
pub mod user;
