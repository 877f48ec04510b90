use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::photo_comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppForm;
use crate::handlers::photo::find_photo;
use crate::models::comment::{CommentForm, validate_comment_form};
use crate::models::shared::mark_edited;
use crate::state::AppState;
use crate::utils::redirect::found;

fn detail_path(photo_id: i32) -> String {
    format!("/photos/{photo_id}/detail/")
}

#[utoipa::path(
    post,
    path = "/photo/{id}/comment/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a photo",
    description = "The comment is attributed to the caller, not to the photo's owner.",
    params(("id" = i32, Path, description = "Photo ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created; redirect to the photo detail, or to the login page when anonymous"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(photo_id): Path<i32>,
    AppForm(form): AppForm<CommentForm>,
) -> Result<Response, AppError> {
    validate_comment_form(&form)?;
    find_photo(&state.db, photo_id).await?;

    let comment = photo_comment::ActiveModel {
        user_id: Set(auth_user.user_id),
        photo_id: Set(photo_id),
        comment: Set(form.comment.trim().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        // Photo deleted between the lookup and the insert.
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Photo not found".into())
        }
        _ => AppError::from(e),
    })?;

    tracing::debug!(comment_id = comment.id, "Comment created");
    Ok(found(&detail_path(photo_id)))
}

#[utoipa::path(
    post,
    path = "/comment/{id}/edit/",
    tag = "Comments",
    operation_id = "editComment",
    summary = "Edit a comment",
    description = "Author only. The stored text is prefixed with `(edited)` unless it already starts with it.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated; redirect to the photo detail, or to the login page when anonymous"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn edit_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppForm(form): AppForm<CommentForm>,
) -> Result<Response, AppError> {
    let comment = find_comment(&state.db, id).await?;
    auth_user.require_owner(comment.user_id)?;
    validate_comment_form(&form)?;

    let text = mark_edited(&form.comment);

    let photo_id = comment.photo_id;
    let mut active = comment.into_active_model();
    active.comment = Set(text);
    active.update(&state.db).await?;

    Ok(found(&detail_path(photo_id)))
}

#[utoipa::path(
    post,
    path = "/comment/{id}/delete/",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Author only.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 302, description = "Deleted; redirect to the photo detail, or to the login page when anonymous"),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let comment = find_comment(&state.db, id).await?;
    auth_user.require_owner(comment.user_id)?;

    photo_comment::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(found(&detail_path(comment.photo_id)))
}

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<photo_comment::Model, AppError> {
    photo_comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}
