//! Field validation rules for user records
//!
//! Rules differ between creating a user and updating one:
//!
//! - on create: `name` (present, 2-45 characters) and `email` (present,
//!   `local@domain` shape)
//! - on update: `name` as above, `username` (present, 2-20 characters,
//!   letters and digits only, reserved `admin` prefix) and `avatar`
//!   (present, image extension)
//!
//! Username uniqueness needs the database and is checked by
//! [`crate::models::user::User::update`].

use crate::error::FieldError;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Minimum length of `name` and `username`
pub const MIN_LENGTH: u64 = 2;

/// Maximum length of `name`
pub const NAME_MAX_LENGTH: u64 = 45;

/// Maximum length of `username`
pub const USERNAME_MAX_LENGTH: u64 = 20;

/// Extensions accepted for avatar files
pub const AVATAR_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Message shown when a username contains anything but letters and digits
pub const USERNAME_FORMAT_MESSAGE: &str = "chỉ được phép chứa ký tự và số";

/// Attributes checked when a user is created
#[derive(Debug, Clone, Validate)]
pub struct NewUserCheck {
    #[validate(
        custom(function = "validate_present"),
        length(min = 2, max = 45)
    )]
    pub name: String,

    #[validate(custom(function = "validate_email"))]
    pub email: String,
}

/// Attributes checked when an existing user is saved
#[derive(Debug, Clone, Validate)]
pub struct UserUpdateCheck {
    #[validate(
        custom(function = "validate_present"),
        length(min = 2, max = 45)
    )]
    pub name: String,

    #[validate(
        custom(function = "validate_username"),
        length(min = 2, max = 20)
    )]
    pub username: String,

    #[validate(custom(function = "validate_avatar"))]
    pub avatar: String,
}

/// Rejects empty or whitespace-only values
pub fn validate_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("presence", "can't be blank"));
    }
    Ok(())
}

/// Presence plus the `local@domain` shape
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    validate_present(value)?;
    if !is_valid_email_format(value) {
        return Err(error("email", "is invalid"));
    }
    Ok(())
}

/// Presence plus the username format rule
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    validate_present(value)?;
    if !is_valid_username_format(value) {
        return Err(error("format", USERNAME_FORMAT_MESSAGE));
    }
    Ok(())
}

/// Presence plus the image extension rule
pub fn validate_avatar(value: &str) -> Result<(), ValidationError> {
    validate_present(value)?;
    if !has_image_extension(value) {
        return Err(error("format", "is invalid"));
    }
    Ok(())
}

/// Letters and digits only; may not start with `admin` (any case) unless it
/// is exactly `admin` followed by one character.
pub fn is_valid_username_format(username: &str) -> bool {
    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let lower = username.to_ascii_lowercase();
    !lower.starts_with("admin") || lower.len() == "admin".len() + 1
}

/// `true` when the path ends in `.png`, `.jpg`, `.jpeg` or `.gif`
///
/// The match is case-sensitive: `photo.PNG` is rejected. The stem may be
/// empty, but the path must be a single line.
pub fn has_image_extension(path: &str) -> bool {
    if path.contains('\n') {
        return false;
    }

    match path.rsplit_once('.') {
        Some((_, ext)) => AVATAR_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// One `@`, no whitespace, something on both sides
pub fn is_valid_email_format(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let well_formed = |part: &str| {
        !part.is_empty() && !part.contains('@') && !part.chars().any(char::is_whitespace)
    };

    well_formed(local) && well_formed(domain)
}

/// Flattens `validator` errors into field errors ordered by field name
pub fn into_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<(String, Vec<ValidationError>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs.clone()))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.into_iter()
                .map(move |err| FieldError::new(field.clone(), describe(&err)))
        })
        .collect()
}

/// Runs `validator` rules and returns the field errors, if any
pub fn check<T: Validate>(value: &T) -> Result<(), Vec<FieldError>> {
    value.validate().map_err(|e| into_field_errors(&e))
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    if err.code == "length" {
        let length = err
            .params
            .get("value")
            .and_then(|v| v.as_str())
            .map(|s| s.chars().count() as u64)
            .unwrap_or(0);
        let min = err.params.get("min").and_then(|v| v.as_u64());
        let max = err.params.get("max").and_then(|v| v.as_u64());

        if let Some(min) = min.filter(|min| length < *min) {
            return format!("is too short (minimum is {} characters)", min);
        }
        if let Some(max) = max.filter(|max| length > *max) {
            return format!("is too long (maximum is {} characters)", max);
        }
    }

    "is invalid".to_string()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}
