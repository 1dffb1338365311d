//! Input validation for Gotcha user registration.

use serde::Deserialize;
use validator::Validate;

use crate::GotchaError;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: u64 = 6;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: u64 = 32;

/// Minimum email length.
pub const MIN_EMAIL_LENGTH: u64 = 6;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: u64 = 64;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: u64 = 64;

/// Registration request data.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(
        length(min = MIN_USERNAME_LENGTH, max = MAX_USERNAME_LENGTH),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[validate(
        email(message = "email is not a valid address"),
        length(min = MIN_EMAIL_LENGTH, max = MAX_EMAIL_LENGTH)
    )]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LENGTH, max = MAX_PASSWORD_LENGTH))]
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validate every field, collecting all failures into one error.
    pub fn check(&self) -> crate::Result<()> {
        self.validate().map_err(into_gotcha_error)
    }
}

/// Username may only contain ASCII letters, digits and underscores.
fn username_chars(value: &str) -> Result<(), validator::ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(validator::ValidationError::new("username_chars").with_message(
            "username can only contain alphanumeric characters and underscores".into(),
        ));
    }
    Ok(())
}

/// Flatten field errors into a single `Validation` error, ordered by field.
fn into_gotcha_error(errors: validator::ValidationErrors) -> GotchaError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| match (&e.message, &*e.code) {
                (Some(message), _) => message.to_string(),
                (None, "length") => match (e.params.get("min"), e.params.get("max")) {
                    (Some(min), Some(max)) => format!("{field} must be {min} to {max} characters"),
                    _ => format!("{field} has an invalid length"),
                },
                (None, _) => format!("invalid value for {field}"),
            })
        })
        .collect();

    GotchaError::Validation(messages.join("; "))
}
