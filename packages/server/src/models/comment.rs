use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::photo_comment;
use crate::error::AppError;

pub const MAX_COMMENT_LEN: usize = 1000;

/// Form body for creating or editing a comment.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentForm {
    #[schema(example = "Lovely colours!")]
    pub comment: String,
}

pub fn validate_comment_form(form: &CommentForm) -> Result<(), AppError> {
    let comment = form.comment.trim();
    if comment.is_empty() {
        return Err(AppError::Validation("Comment must not be empty".into()));
    }
    super::shared::validate_text(comment, "Comment", MAX_COMMENT_LEN)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = 1)]
    pub photo_id: i32,
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = "bob_99")]
    pub username: String,
    #[schema(example = "Lovely colours!")]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    /// Whether the caller wrote this comment and may edit or delete it.
    pub editable: bool,
}

impl CommentResponse {
    pub fn new(comment: photo_comment::Model, username: String, viewer: Option<i32>) -> Self {
        Self {
            editable: viewer == Some(comment.user_id),
            id: comment.id,
            photo_id: comment.photo_id,
            user_id: comment.user_id,
            username,
            comment: comment.comment,
            created_at: comment.created_at,
        }
    }
}
