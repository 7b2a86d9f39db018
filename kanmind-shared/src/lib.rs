//! # KanMind Shared Library
//!
//! Data model, persistence and credential handling used by the KanMind API.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and embedded migrations
//! - `models`: Users, boards, tasks, comments and auth tokens
//! - `auth`: Password hashing, bearer tokens and authorization rules

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the KanMind shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
