/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; the error side renders as
///
/// ```json
/// { "error": "validation_error", "message": "...", "details": [{ "field": "email", "message": "..." }] }
/// ```
///
/// with `details` present only for validation errors.
///
/// # Example
///
/// ```
/// use kanmind_api::error::{ApiError, ApiResult};
///
/// fn check_title(title: &str) -> ApiResult<()> {
///     if title.trim().is_empty() {
///         return Err(ApiError::field("title", "This field may not be blank."));
///     }
///     Ok(())
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanmind_shared::auth::{authorization::AuthzError, middleware::AuthError, password::PasswordError};
use kanmind_shared::models::{board::OWNER_TITLE_CONSTRAINT, user::EMAIL_CONSTRAINT};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field-scoped validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Missing or invalid token (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Validation errors, one per field and message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// Validation error from collected details, ordered by field
    pub fn validation(mut details: Vec<ValidationErrorDetail>) -> Self {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

/// Field errors gathered from parsing, `validator` rules and lookups, so a
/// request reports every bad field at once. The first error recorded for a
/// field wins over later rule errors for the same field.
#[derive(Debug, Default)]
pub struct FieldErrors {
    details: Vec<ValidationErrorDetail>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.details.push(ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.details.iter().any(|d| d.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Adds `validator` errors for fields that have none yet.
    pub fn merge(&mut self, errors: &validator::ValidationErrors) {
        for detail in validation_details(errors) {
            if !self.has(&detail.field) {
                self.details.push(detail);
            }
        }
    }

    /// `Ok` when nothing was recorded, otherwise one validation error.
    pub fn into_result(self) -> ApiResult<()> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.details))
        }
    }
}

/// Flattens `validator` errors into per-field details, ordered by field.
pub fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value.".to_string()),
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Unique and foreign key violations that slipped past the boundary checks
/// become validation errors; everything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match (db_err.kind(), db_err.constraint()) {
                (ErrorKind::UniqueViolation, Some(EMAIL_CONSTRAINT)) => {
                    ApiError::field("email", "A user with this email already exists.")
                }
                (ErrorKind::UniqueViolation, Some(OWNER_TITLE_CONSTRAINT)) => {
                    ApiError::field("title", "This owner already has a board with this title.")
                }
                (ErrorKind::ForeignKeyViolation, constraint) => ApiError::BadRequest(format!(
                    "Referenced resource does not exist ({})",
                    constraint.unwrap_or("unknown constraint")
                )),
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(e) => ApiError::InternalError(format!("Database error: {}", e)),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Ids in paths that do not parse cannot name an existing resource.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::NotFound(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Enter a valid email address."))]
        email: String,

        #[validate(length(min = 1, message = "This field may not be blank."))]
        content: String,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Board not found".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::field("title", "x"), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let response = ApiError::field("repeated_password", "Passwords do not match.").into_response();
        let json = body_json(response).await;

        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"][0]["field"], "repeated_password");
        assert_eq!(json["details"][0]["message"], "Passwords do not match.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_message() {
        let json = body_json(ApiError::InternalError("secret detail".into()).into_response()).await;

        assert_eq!(json["message"], "An internal error occurred");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_validator_errors_collected_per_field() {
        let sample = Sample {
            email: "not-an-email".to_string(),
            content: String::new(),
        };

        let err = ApiError::from(sample.validate().unwrap_err());
        let ApiError::ValidationError(details) = err else {
            panic!("expected validation error");
        };

        assert_eq!(
            details,
            vec![
                ValidationErrorDetail {
                    field: "content".to_string(),
                    message: "This field may not be blank.".to_string(),
                },
                ValidationErrorDetail {
                    field: "email".to_string(),
                    message: "Enter a valid email address.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_authz_error_is_forbidden() {
        let err = ApiError::from(AuthzError::Forbidden {
            operation: "delete",
            resource: "task",
        });
        assert!(matches!(err, ApiError::Forbidden(ref m) if m.contains("delete this task")));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::DatabaseError(sqlx::Error::PoolTimedOut)),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_404() {
        assert!(matches!(ApiError::from(sqlx::Error::RowNotFound), ApiError::NotFound(_)));
    }

    #[test]
    fn test_field_errors_merge_keeps_first_error() {
        let sample = Sample {
            email: "not-an-email".to_string(),
            content: String::new(),
        };

        let mut errors = FieldErrors::new();
        errors.add("content", "This field is required.");
        errors.add("members", "Unknown user id(s): x");
        errors.merge(&sample.validate().unwrap_err());

        assert!(errors.has("email"));
        let ApiError::ValidationError(details) = errors.into_result().unwrap_err() else {
            panic!("expected validation error");
        };

        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["content", "email", "members"]);
        assert_eq!(details[0].message, "This field is required.");
    }

    #[test]
    fn test_field_errors_empty_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
