/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`token`]: opaque bearer token generation and hashing
/// - [`middleware`]: bearer token lookup and the Axum middleware
/// - [`authorization`]: pure permission rules over boards, tasks and comments

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
