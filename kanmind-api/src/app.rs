/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use kanmind_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{delete, get, post},
    Router,
};
use kanmind_shared::auth::middleware::token_auth;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /health                                      public
/// /registration/                               public   POST
/// /login/                                      public   POST
/// /email-check/?email=                         token    GET
/// /users/                                      token    GET
/// /boards/                                     token    GET POST
/// /boards/{board_id}/                          token    GET PATCH DELETE
/// /tasks/                                      token    GET POST
/// /tasks/assigned-to-me/                       token    GET
/// /tasks/reviewing/                            token    GET
/// /tasks/{task_id}/                            token    GET PATCH DELETE
/// /tasks/{task_id}/comments/                   token    GET POST
/// /tasks/{task_id}/comments/{comment_id}/      token    DELETE
/// ```
///
/// # Middleware Stack
///
/// 1. CORS (tower-http CorsLayer)
/// 2. Request spans (tower-http TraceLayer); `user_id` is filled in once
///    the token is resolved
/// 3. Bearer token authentication on the protected routes only
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/registration/", post(routes::auth::register))
        .route("/login/", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/email-check/", get(routes::users::email_check))
        .route("/users/", get(routes::users::list_users))
        .route(
            "/boards/",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/boards/:board_id/",
            get(routes::boards::get_board)
                .patch(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route(
            "/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/assigned-to-me/", get(routes::tasks::assigned_to_me))
        .route("/tasks/reviewing/", get(routes::tasks::reviewing))
        .route(
            "/tasks/:task_id/",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/tasks/:task_id/comments/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/tasks/:task_id/comments/:comment_id/",
            delete(routes::comments::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state.db.clone(), token_auth));

    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
