//! Request and response shapes
//!
//! Requests are read field by field from a JSON object with [`Fields`], so
//! a missing field, a mistyped value and a failed `validator` rule all end
//! up in one list of field errors. Responses are built from model rows plus
//! a `UserDirectory` so user references render as full objects. Nothing here
//! touches the database.
//!
//! - `user`: registration, login, email lookup
//! - `board`: board summary/detail and board writes
//! - `task`: task responses and writes
//! - `comment`: comment responses and writes

pub mod board;
pub mod comment;
pub mod task;
pub mod user;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";

/// A request shape readable from [`Fields`]. Fields that fail to read are
/// recorded as errors and filled with defaults.
pub trait FromFields: Sized {
    fn from_fields(fields: &mut Fields<'_>) -> Self;
}

/// Reader over the members of a JSON object body
///
/// Unknown members are ignored. Text is trimmed.
pub struct Fields<'a> {
    map: Map<String, Value>,
    errors: &'a mut FieldErrors,
}

impl<'a> Fields<'a> {
    /// Fails unless `body` is a JSON object.
    pub fn new(body: Value, errors: &'a mut FieldErrors) -> Result<Self, ApiError> {
        match body {
            Value::Object(map) => Ok(Self { map, errors }),
            _ => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
        }
    }

    /// A value that must be present and not `null`.
    pub fn required<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        match self.map.remove(name) {
            None | Some(Value::Null) => {
                self.errors.add(name, REQUIRED);
                None
            }
            Some(value) => self.convert(name, value),
        }
    }

    /// Absent and `null` both read as `None`.
    pub fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        match self.map.remove(name) {
            None | Some(Value::Null) => None,
            Some(value) => self.convert(name, value),
        }
    }

    /// Absent is `None`; `null` is `Some(None)`.
    pub fn nullable<T: DeserializeOwned>(&mut self, name: &str) -> Option<Option<T>> {
        match self.map.remove(name) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(value) => self.convert(name, value).map(Some),
        }
    }

    /// Required text, trimmed. Missing or mistyped text reads as `""`.
    pub fn text(&mut self, name: &str) -> String {
        self.required::<String>(name)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Optional text, trimmed.
    pub fn optional_text(&mut self, name: &str) -> Option<String> {
        self.optional::<String>(name).map(|s| s.trim().to_string())
    }

    /// Required text taken as is (passwords).
    pub fn raw_text(&mut self, name: &str) -> String {
        self.required::<String>(name).unwrap_or_default()
    }

    fn convert<T: DeserializeOwned>(&mut self, name: &str, value: Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.add(name, format!("Invalid value: {}", e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read<R>(body: Value, f: impl FnOnce(&mut Fields<'_>) -> R) -> (R, FieldErrors) {
        let mut errors = FieldErrors::new();
        let value = {
            let mut fields = Fields::new(body, &mut errors).unwrap();
            f(&mut fields)
        };
        (value, errors)
    }

    #[test]
    fn test_required_and_optional() {
        let ((a, b, c), errors) = read(json!({ "a": 1, "c": null }), |f| {
            (f.required::<u32>("a"), f.required::<u32>("b"), f.optional::<u32>("c"))
        });

        assert_eq!((a, b, c), (Some(1), None, None));
        assert!(errors.has("b"));
        assert!(!errors.has("a"));
        assert!(!errors.has("c"));
    }

    #[test]
    fn test_nullable() {
        let ((absent, null, set), errors) = read(json!({ "n": null, "s": 3 }), |f| {
            (f.nullable::<u32>("a"), f.nullable::<u32>("n"), f.nullable::<u32>("s"))
        });

        assert_eq!(absent, None);
        assert_eq!(null, Some(None));
        assert_eq!(set, Some(Some(3)));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_mistyped_values_are_field_errors() {
        let (_, errors) = read(json!({ "a": "x", "b": 5 }), |f| {
            (f.required::<u32>("a"), f.text("b"))
        });

        assert!(errors.has("a"));
        assert!(errors.has("b"));
    }

    #[test]
    fn test_text_is_trimmed() {
        let ((title, blank, note), errors) = read(json!({ "title": "  Sprint 1 ", "blank": "   " }), |f| {
            (f.text("title"), f.text("blank"), f.optional_text("note"))
        });

        assert_eq!(title, "Sprint 1");
        assert_eq!(blank, "");
        assert_eq!(note, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_body_must_be_object() {
        let mut errors = FieldErrors::new();
        assert!(matches!(
            Fields::new(json!([1, 2]), &mut errors),
            Err(ApiError::BadRequest(_))
        ));
    }
}
