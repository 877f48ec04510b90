use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comment::CommentResponse;
use super::shared::{Pagination, media_url};
use crate::entity::photo;

pub const MAX_MESSAGE_LEN: usize = 2000;

/// Form body of `POST /photos/{id}/edit/`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct EditPhotoForm {
    #[schema(example = "Sunset at the pier, take two")]
    pub message: String,
}

/// A photo as shown in lists and on the detail page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = "alice_w")]
    pub username: String,
    #[schema(example = "/media/photos/sunset_1a2b3c4d.jpg")]
    pub pic_url: String,
    #[schema(example = "/media/thumbnails/thumb_sunset_1a2b3c4d.jpg")]
    pub thumbnail_url: String,
    #[schema(example = "Sunset at the pier")]
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Whether the caller owns this photo and may edit or delete it.
    pub editable: bool,
}

impl PhotoResponse {
    pub fn new(photo: photo::Model, username: String, viewer: Option<i32>) -> Self {
        Self {
            editable: viewer == Some(photo.user_id),
            id: photo.id,
            user_id: photo.user_id,
            username,
            pic_url: media_url(&photo.pic),
            thumbnail_url: media_url(&photo.thumbnail),
            message: photo.message,
            created_at: photo.created_at,
        }
    }
}

/// A page of photos.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoListResponse {
    pub data: Vec<PhotoResponse>,
    pub pagination: Pagination,
}

/// A photo with its comments, oldest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoDetailResponse {
    pub photo: PhotoResponse,
    pub comments: Vec<CommentResponse>,
}
