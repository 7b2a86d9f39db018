/// Registration, login and email lookup shapes

use kanmind_shared::models::user::User;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{FromFields, Fields};
use crate::error::FieldErrors;

const BLANK: &str = "This field may not be blank.";

/// `POST /registration/`
#[derive(Debug, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(custom(function = "validate_fullname"))]
    pub fullname: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub repeated_password: String,
}

impl FromFields for RegisterRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            email: fields.text("email"),
            fullname: fields.text("fullname"),
            password: fields.raw_text("password"),
            repeated_password: fields.raw_text("repeated_password"),
        }
    }
}

impl RegisterRequest {
    /// Records a mismatch on `repeated_password` when both passwords were
    /// readable.
    pub fn check_passwords(&self, errors: &mut FieldErrors) {
        if errors.has("password") || errors.has("repeated_password") {
            return;
        }
        if self.password != self.repeated_password {
            errors.add("repeated_password", "Passwords do not match.");
        }
    }
}

/// Exactly two alphabetic words separated by one space, after trimming.
pub fn validate_fullname(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error("blank", BLANK));
    }

    let parts: Vec<&str> = trimmed.split(' ').collect();
    let well_formed = parts.len() == 2
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(char::is_alphabetic));

    if well_formed {
        Ok(())
    } else {
        Err(error(
            "fullname_format",
            "Enter first and last name separated by a single space, letters only.",
        ))
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// `POST /login/`
#[derive(Debug, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

impl FromFields for LoginRequest {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        Self {
            email: fields.text("email"),
            password: fields.raw_text("password"),
        }
    }
}

/// `GET /email-check/?email=`
#[derive(Debug, Deserialize, Validate)]
pub struct EmailCheckQuery {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

/// Returned by registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub fullname: String,
    pub email: String,
    pub user_id: Uuid,
}

impl AuthResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            token,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            user_id: user.id,
        }
    }
}
