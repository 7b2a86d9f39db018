//! Common test utilities for integration tests
//!
//! Tests need a PostgreSQL database named by DATABASE_URL. When it is unset
//! `TestContext::new` returns `None` and the test returns early.
//!
//! Requests go through the full router (auth middleware included) with
//! `tower::ServiceExt::oneshot`; no socket is opened.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use kanmind_api::app::{build_router, AppState};
use kanmind_api::config::Config;
use kanmind_shared::db::migrations::run_migrations;
use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Password used for every registered test user
pub const PASSWORD: &str = "s3cret-pass";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
}

/// A registered user and their token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
    pub token: String,
}

impl TestContext {
    /// Connects, migrates and builds the router; `None` without DATABASE_URL.
    pub async fn new() -> Option<Self> {
        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        }

        let config = Config::from_env().expect("Failed to load config");
        let db = create_pool(DatabaseConfig {
            max_connections: 5,
            ..DatabaseConfig::new(config.database.url.clone())
        })
        .await
        .expect("Failed to create pool");
        run_migrations(&db).await.expect("Migrations failed");

        let app = build_router(AppState::new(db.clone(), config));

        Some(Self { db, app })
    }

    /// Sends a request and returns status plus JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Registers a user with a unique email through the API.
    pub async fn register(&self, fullname: &str) -> TestUser {
        let email = unique_email();
        let (status, body) = self
            .request(
                Method::POST,
                "/registration/",
                None,
                Some(json!({
                    "email": email,
                    "fullname": fullname,
                    "password": PASSWORD,
                    "repeated_password": PASSWORD,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

        TestUser {
            id: parse_id(&body["user_id"]),
            email,
            fullname: fullname.to_string(),
            token: body["token"].as_str().expect("token missing").to_string(),
        }
    }

    /// Creates a board through the API and returns its id.
    pub async fn create_board(&self, owner: &TestUser, title: &str, members: &[&TestUser]) -> Uuid {
        let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let (status, body) = self
            .post("/boards/", owner, json!({ "title": title, "members": member_ids }))
            .await;

        assert_eq!(status, StatusCode::CREATED, "board creation failed: {body}");
        parse_id(&body["id"])
    }

    /// Creates a task through the API and returns its id.
    pub async fn create_task(&self, user: &TestUser, board_id: Uuid, extra: Value) -> Uuid {
        let mut body = json!({ "board": board_id, "title": "Task" });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }

        let (status, body) = self.post("/tasks/", user, body).await;
        assert_eq!(status, StatusCode::CREATED, "task creation failed: {body}");
        parse_id(&body["id"])
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

/// Unique board title, since titles are unique per owner
pub fn unique_title(prefix: &str) -> String {
    format!("{} {}", prefix, &Uuid::new_v4().to_string()[..8])
}

pub fn parse_id(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("expected uuid, got {value}"))
}

/// Field names in a validation error body
pub fn error_fields(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
