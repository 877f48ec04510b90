use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Signup form.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupForm {
    /// Unique username (5-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_w")]
    pub username: String,
    /// Password (5-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password1: String,
    /// Password confirmation, must equal `password1`.
    #[schema(example = "s3cure_P@ss!")]
    pub password2: String,
}

pub fn validate_signup_form(form: &SignupForm) -> Result<(), AppError> {
    let username = form.username.trim();
    let len = username.chars().count();
    if !(5..=32).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 5-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    let plen = form.password1.chars().count();
    if !(5..=128).contains(&plen) {
        return Err(AppError::Validation(
            "Password must be 5-128 characters".into(),
        ));
    }
    if form.password1 != form.password2 {
        return Err(AppError::Validation(
            "The two password fields didn't match".into(),
        ));
    }
    Ok(())
}

/// Login form.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginForm {
    #[schema(example = "alice_w")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Local path to go to after logging in.
    #[schema(example = "/myphoto/")]
    pub next: Option<String>,
}

pub fn validate_login_form(form: &LoginForm) -> Result<(), AppError> {
    if form.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Current user info.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_w")]
    pub username: String,
}
