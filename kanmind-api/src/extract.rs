/// Request extractors that reject with [`ApiError`]
///
/// - [`AppJson`]: `axum::Json` whose rejection renders as a JSON 400
/// - [`ValidJson`]: reads a [`FromFields`] shape and runs `validator` rules,
///   rejecting with every field error at once
/// - [`ValidQuery`]: deserializes and validates a query string
/// - [`AppPath`]: path parameters; an unparseable id is a 404
///
/// Handlers that check a path resource before the payload, or that add
/// their own lookups to the field errors, take `AppJson<serde_json::Value>`
/// and call [`parse_body`].

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{ApiError, FieldErrors};
use crate::schemas::{FromFields, Fields};

/// JSON body extractor with [`ApiError`] rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameters with [`ApiError`] rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Validated JSON body
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: FromFields + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(body) = AppJson::<serde_json::Value>::from_request(req, state).await?;

        let mut errors = FieldErrors::new();
        let value = parse_body(body, &mut errors)?;
        errors.into_result()?;

        Ok(ValidJson(value))
    }
}

/// Validated query string
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidQuery(value))
    }
}

/// Reads `T` from a JSON object body and runs its `validator` rules,
/// recording problems in `errors`. Only a body that is not an object fails
/// here; the caller adds its own checks and then calls
/// [`FieldErrors::into_result`].
pub fn parse_body<T>(body: serde_json::Value, errors: &mut FieldErrors) -> Result<T, ApiError>
where
    T: FromFields + Validate,
{
    let value = {
        let mut fields = Fields::new(body, errors)?;
        T::from_fields(&mut fields)
    };

    if let Err(rules) = value.validate() {
        errors.merge(&rules);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        content: String,

        #[validate(range(min = 1, message = "Must be positive."))]
        count: u32,
    }

    impl FromFields for Payload {
        fn from_fields(fields: &mut Fields<'_>) -> Self {
            Self {
                content: fields.text("content"),
                count: fields.required("count").unwrap_or_default(),
            }
        }
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn fields_of(err: ApiError) -> Vec<String> {
        match err {
            ApiError::ValidationError(details) => details.into_iter().map(|d| d.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_json_accepts() {
        let request = json_request(r#"{"content":" hi ","count":2}"#);
        let ValidJson(payload) = ValidJson::<Payload>::from_request(request, &()).await.unwrap();

        assert_eq!(payload.content, "hi");
        assert_eq!(payload.count, 2);
    }

    #[tokio::test]
    async fn test_valid_json_reports_every_field() {
        let err = ValidJson::<Payload>::from_request(json_request(r#"{"content":"   "}"#), &())
            .await
            .unwrap_err();
        assert_eq!(fields_of(err), vec!["content", "count"]);

        let err = ValidJson::<Payload>::from_request(json_request(r#"{"content":"x","count":"two"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(fields_of(err), vec!["count"]);
    }

    #[tokio::test]
    async fn test_valid_json_rejects_malformed_body() {
        let err = ValidJson::<Payload>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = ValidJson::<Payload>::from_request(json_request("[]"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_valid_query() {
        #[derive(Debug, Deserialize, Validate)]
        struct Lookup {
            #[validate(email(message = "Enter a valid email address."))]
            email: String,
        }

        let request = HttpRequest::builder()
            .uri("/email-check/?email=jane%40example.com")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let ValidQuery(lookup) = ValidQuery::<Lookup>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(lookup.email, "jane@example.com");

        let request = HttpRequest::builder().uri("/email-check/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let err = ValidQuery::<Lookup>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_parse_body_leaves_errors_to_caller() {
        let mut errors = FieldErrors::new();
        let payload: Payload =
            parse_body(json!({ "content": "x", "count": 0, "author": "ignored" }), &mut errors).unwrap();

        assert_eq!(payload.content, "x");
        assert!(errors.has("count"));

        errors.add("members", "Unknown user id(s): x");
        assert_eq!(fields_of(errors.into_result().unwrap_err()), vec!["count", "members"]);
    }
}
