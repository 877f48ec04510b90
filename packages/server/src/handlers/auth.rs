use axum::{Json, extract::State, response::IntoResponse, response::Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{photo, photo_comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, SESSION_COOKIE};
use crate::extractors::form::AppForm;
use crate::models::auth::{
    LoginForm, MeResponse, SignupForm, validate_login_form, validate_signup_form,
};
use crate::state::AppState;
use crate::utils::redirect::{LOGIN_PATH, found, safe_next};
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/accounts/signup/",
    tag = "Accounts",
    operation_id = "signup",
    summary = "Create an account",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created; redirect to the login page"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppForm(form): AppForm<SignupForm>,
) -> Result<Response, AppError> {
    validate_signup_form(&form)?;

    let username = form.username.trim().to_string();

    let hash = hash::hash_password(&form.password1)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        username: Set(username),
        password: Set(hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok(found(LOGIN_PATH))
}

#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "Accounts",
    operation_id = "login",
    summary = "Log in",
    description = "Sets the `photoboard_session` cookie and redirects to `next` (local paths only) or `/`.",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in; redirect to `next` or /"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppForm(form): AppForm<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_form(&form)?;

    let username = form.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&form.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &state.config.auth;
    let token = jwt::sign(user.id, &user.username, &auth.jwt_secret, auth.token_ttl_hours)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(auth.secure_cookie)
        .max_age(time::Duration::hours(auth.token_ttl_hours));

    Ok((jar.add(cookie), found(safe_next(form.next.as_deref()))))
}

#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "Accounts",
    operation_id = "logout",
    summary = "Log out",
    responses(
        (status = 302, description = "Session cookie cleared; redirect to /"),
    ),
)]
#[instrument(skip(jar, auth_user))]
pub async fn logout(auth_user: Option<AuthUser>, jar: CookieJar) -> impl IntoResponse {
    if let Some(user) = auth_user {
        tracing::debug!(user_id = user.user_id, "User logged out");
    }
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), found("/"))
}

#[utoipa::path(
    post,
    path = "/accounts/delete/",
    tag = "Accounts",
    operation_id = "deleteAccount",
    summary = "Delete the caller's account",
    description = "Refused while the account still owns photos. The caller's comments are removed with it.",
    responses(
        (status = 302, description = "Deleted; redirect to /, or to the login page when anonymous"),
        (status = 409, description = "Account still owns photos (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user, jar), fields(user_id = auth_user.user_id))]
pub async fn delete_account(
    auth_user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let photo_count = photo::Entity::find()
        .filter(photo::Column::UserId.eq(auth_user.user_id))
        .count(&txn)
        .await?;
    if photo_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete an account that still owns photos".into(),
        ));
    }

    photo_comment::Entity::delete_many()
        .filter(photo_comment::Column::UserId.eq(auth_user.user_id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(auth_user.user_id)
        .exec(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // A photo was uploaded after the count.
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(
                "Cannot delete an account that still owns photos".into(),
            ),
            _ => AppError::from(e),
        })?;

    txn.commit().await?;

    tracing::info!(user_id = auth_user.user_id, "Account deleted");
    Ok((jar.remove(Cookie::build(SESSION_COOKIE).path("/")), found("/")))
}

#[utoipa::path(
    get,
    path = "/accounts/me/",
    tag = "Accounts",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Current user info", body = MeResponse),
        (status = 302, description = "Anonymous; redirect to the login page"),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth_user.user_id,
        username: auth_user.username,
    })
}
