/// API route handlers, one module per resource
///
/// - `health`: health check
/// - `auth`: registration and login
/// - `users`: user list and email lookup
/// - `boards`: board list/create/detail/update/delete
/// - `tasks`: task list/create/detail/update/delete and personal views
/// - `comments`: comment list/create/delete under a task

pub mod auth;
pub mod boards;
pub mod comments;
pub mod health;
pub mod tasks;
pub mod users;
