/// User model and database operations
///
/// Users are identified by email. Passwords are stored as Argon2id hashes and
/// never leave this crate in a response shape; see `PublicUser`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     fullname VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "jane@example.com".to_string(),
///     fullname: "Jane Doe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// // CITEXT makes the lookup case-insensitive
/// let found = User::find_by_email(&pool, "JANE@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Name of the unique constraint on `users.email`
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

const USER_COLUMNS: &str =
    "id, email, fullname, password_hash, is_active, is_staff, created_at";

/// A registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique and case-insensitive (CITEXT)
    pub email: String,

    /// Display name ("Firstname Lastname")
    pub fullname: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// Inactive users can neither log in nor use existing tokens
    pub is_active: bool,

    /// Staff flag, carried for administration tooling
    pub is_staff: bool,

    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Public representation of a user: never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            fullname: user.fullname.clone(),
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            fullname: user.fullname,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub fullname: String,

    /// Argon2id hash, NOT the plaintext password
    pub password_hash: String,
}

impl User {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// A duplicate email surfaces as a unique violation on [`EMAIL_CONSTRAINT`].
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, fullname, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.fullname)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Whether any user (active or not) already holds this email.
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Loads every user whose id is in `ids`. Unknown ids are skipped.
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");

        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Returns the subset of `ids` that does not name an existing user.
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        let found: HashMap<Uuid, User> = Self::find_by_ids(pool, ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(ids.iter().copied().filter(|id| !found.contains_key(id)).collect())
    }

    /// Every user, oldest registration first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }
}

/// Id-keyed lookup table of public users, used to expand id references
/// (assignee, reviewer, members) into full objects at read time.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<Uuid, PublicUser>,
}

impl UserDirectory {
    /// Loads the users named by `ids` in one query.
    pub async fn load(pool: &PgPool, ids: impl IntoIterator<Item = Uuid>) -> Result<Self, sqlx::Error> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let users = User::find_by_ids(pool, &ids).await?;
        Ok(Self::from_users(users))
    }

    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, PublicUser::from(u))).collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&PublicUser> {
        self.users.get(&id)
    }

    /// Resolves an optional reference; a dangling id renders as absent.
    pub fn resolve(&self, id: Option<Uuid>) -> Option<PublicUser> {
        id.and_then(|id| self.get(id).cloned())
    }
}
