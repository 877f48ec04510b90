use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "photoboard_session";

/// Authenticated user, taken from the session cookie or an
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require a login; anonymous requests are
/// redirected to the login page. Use `Option<AuthUser>` where a login is optional.
/// Ownership checks happen via `require_owner()` in the handler body.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

impl AuthUser {
    /// Returns `Ok(())` if the user owns the row, `Err(PermissionDenied)` otherwise.
    pub fn require_owner(&self, owner_id: i32) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

/// Resolve the caller. `Ok(None)` means anonymous.
///
/// A bad bearer token is an error, since the client asked for it explicitly.
/// A bad or stale cookie (expired, wrong secret, deleted account) is ignored.
async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let secret = &state.config.auth.jwt_secret;

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::TokenInvalid)?;
        let claims = jwt::verify(token, secret).map_err(|_| AppError::TokenInvalid)?;
        return match load(state, claims.uid).await? {
            Some(user) => Ok(Some(user)),
            None => Err(AppError::TokenInvalid),
        };
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    match jwt::verify(cookie.value(), secret) {
        Ok(claims) => load(state, claims.uid).await,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session cookie");
            Ok(None)
        }
    }
}

async fn load(state: &AppState, user_id: i32) -> Result<Option<AuthUser>, AppError> {
    let user = user::Entity::find_by_id(user_id).one(&state.db).await?;
    Ok(user.map(|u| AuthUser {
        user_id: u.id,
        username: u.username,
    }))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .ok_or_else(|| AppError::LoginRequired {
                next: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_owned())
                    .unwrap_or_else(|| parts.uri.path().to_owned()),
            })
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        resolve(parts, state).await
    }
}
