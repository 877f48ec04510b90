use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use common::imaging;
use common::storage::{MediaStore, PHOTOS_DIR, THUMBNAILS_DIR, thumbnail_name, upload_name};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{photo, photo_comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppForm;
use crate::models::comment::CommentResponse;
use crate::models::photo::{
    EditPhotoForm, MAX_MESSAGE_LEN, PhotoDetailResponse, PhotoListResponse, PhotoResponse,
};
use crate::models::shared::{ListQuery, Pagination, mark_edited, validate_text};
use crate::state::AppState;
use crate::utils::filename::validate_upload_filename;
use crate::utils::redirect::found;

pub fn upload_body_limit(max_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_size)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Photos",
    operation_id = "listPhotos",
    summary = "List all photos, newest first",
    description = "Returns one page of photos from every user. Page size is `media.page_size` (15 by default).",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of photos", body = PhotoListResponse),
    ),
)]
#[instrument(skip(state, viewer))]
pub async fn list_photos(
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PhotoListResponse>, AppError> {
    let viewer = viewer.map(|u| u.user_id);
    let page = photo_page(&state, photo::Entity::find(), query.page(), viewer).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/myphoto/",
    tag = "Photos",
    operation_id = "listMyPhotos",
    summary = "List the caller's photos, newest first",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of the caller's photos", body = PhotoListResponse),
        (status = 302, description = "Anonymous; redirect to the login page"),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_photos(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PhotoListResponse>, AppError> {
    let select = photo::Entity::find().filter(photo::Column::UserId.eq(auth_user.user_id));
    let page = photo_page(&state, select, query.page(), Some(auth_user.user_id)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/photos/{id}/detail/",
    tag = "Photos",
    operation_id = "getPhoto",
    summary = "Get a photo with its comments",
    description = "Comments are ordered oldest first.",
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo and comments", body = PhotoDetailResponse),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer))]
pub async fn photo_detail(
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PhotoDetailResponse>, AppError> {
    let viewer = viewer.map(|u| u.user_id);
    let photo = find_photo(&state.db, id).await?;

    let comments = photo_comment::Entity::find()
        .filter(photo_comment::Column::PhotoId.eq(id))
        .order_by_asc(photo_comment::Column::CreatedAt)
        .order_by_asc(photo_comment::Column::Id)
        .all(&state.db)
        .await?;

    let mut user_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
    user_ids.push(photo.user_id);
    let mut names = usernames(&state.db, user_ids).await?;

    let comments = comments
        .into_iter()
        .map(|c| {
            let name = names.get(&c.user_id).cloned().unwrap_or_default();
            CommentResponse::new(c, name, viewer)
        })
        .collect();
    let owner = names.remove(&photo.user_id).unwrap_or_default();

    Ok(Json(PhotoDetailResponse {
        photo: PhotoResponse::new(photo, owner, viewer),
        comments,
    }))
}

#[utoipa::path(
    post,
    path = "/photos/create/",
    tag = "Photos",
    operation_id = "createPhoto",
    summary = "Upload a photo",
    description = "Multipart form with a `pic` file field and an optional `message` text field. \
        Originals longer than 800px on their long side are downscaled to 800px; a thumbnail \
        bounded to 300x300 is generated alongside. Nothing is stored if any step fails.",
    request_body(content_type = "multipart/form-data", description = "`pic` image file and optional `message`"),
    responses(
        (status = 302, description = "Created; redirect to /, or to the login page when anonymous"),
        (status = 400, description = "Invalid upload (VALIDATION_ERROR, INVALID_IMAGE)", body = ErrorBody),
        (status = 401, description = "Bad bearer token (TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "Upload too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut message: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("pic") => {
                let filename = field
                    .file_name()
                    .map(str::to_owned)
                    .ok_or_else(|| AppError::Validation("'pic' must be a file".into()))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some((filename, bytes.to_vec()));
            }
            Some("message") => {
                message = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'pic' field".into()))?;
    let filename = validate_upload_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();
    if bytes.is_empty() {
        return Err(AppError::Validation("The submitted file is empty".into()));
    }

    let message = match message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => photo::DEFAULT_MESSAGE.to_string(),
    };
    validate_text(&message, "Message", MAX_MESSAGE_LEN)?;

    let source = filename.clone();
    let normalized = tokio::task::spawn_blocking(move || imaging::normalize_upload(&bytes, &source))
        .await
        .map_err(|e| AppError::Internal(format!("Image task failed: {e}")))??;

    let name = upload_name(&filename);
    let pic = format!("{PHOTOS_DIR}/{name}");
    let thumbnail = format!("{THUMBNAILS_DIR}/{}", thumbnail_name(&name));

    state.media.put(&pic, &normalized.original).await?;
    if let Err(e) = state.media.put(&thumbnail, &normalized.thumbnail).await {
        discard(&*state.media, &[pic.as_str()]).await;
        return Err(e.into());
    }

    let photo = match insert_photo(&state.db, auth_user.user_id, &pic, &thumbnail, message).await {
        Ok(photo) => photo,
        Err(e) => {
            discard(&*state.media, &[pic.as_str(), thumbnail.as_str()]).await;
            return Err(e);
        }
    };

    tracing::info!(
        photo_id = photo.id,
        pic = %photo.pic,
        size = ?normalized.original_size,
        rescaled = normalized.rescaled,
        "Photo uploaded"
    );
    Ok(found("/"))
}

#[utoipa::path(
    post,
    path = "/photos/{id}/edit/",
    tag = "Photos",
    operation_id = "editPhoto",
    summary = "Edit a photo's message",
    description = "Owner only. The stored message is prefixed with `(edited)` unless it already starts with it.",
    params(("id" = i32, Path, description = "Photo ID")),
    request_body(content = EditPhotoForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated; redirect to /, or to the login page when anonymous"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn edit_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppForm(form): AppForm<EditPhotoForm>,
) -> Result<Response, AppError> {
    let photo = find_photo(&state.db, id).await?;
    auth_user.require_owner(photo.user_id)?;

    validate_text(form.message.trim(), "Message", MAX_MESSAGE_LEN)?;
    let message = mark_edited(&form.message);

    let mut active = photo.into_active_model();
    active.message = Set(message);
    active.update(&state.db).await?;

    Ok(found("/"))
}

#[utoipa::path(
    post,
    path = "/photos/{id}/delete/",
    tag = "Photos",
    operation_id = "deletePhoto",
    summary = "Delete a photo",
    description = "Owner only. Removes the photo, all of its comments, and its media files.",
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 302, description = "Deleted; redirect to /, or to the login page when anonymous"),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("session" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let txn = state.db.begin().await?;

    let photo = find_photo(&txn, id).await?;
    auth_user.require_owner(photo.user_id)?;

    let removed = photo_comment::Entity::delete_many()
        .filter(photo_comment::Column::PhotoId.eq(id))
        .exec(&txn)
        .await?;
    photo::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    discard(&*state.media, &[photo.pic.as_str(), photo.thumbnail.as_str()]).await;
    tracing::info!(photo_id = id, comments = removed.rows_affected, "Photo deleted");

    Ok(found("/"))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

async fn insert_photo(
    db: &DatabaseConnection,
    user_id: i32,
    pic: &str,
    thumbnail: &str,
    message: String,
) -> Result<photo::Model, AppError> {
    let txn = db.begin().await?;
    let photo = photo::ActiveModel {
        user_id: Set(user_id),
        pic: Set(pic.to_owned()),
        thumbnail: Set(thumbnail.to_owned()),
        message: Set(message),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    Ok(photo)
}

/// Best-effort removal of media files; failures are logged, not returned.
async fn discard(media: &dyn MediaStore, paths: &[&str]) {
    for path in paths {
        if let Err(e) = media.delete(path).await {
            tracing::warn!(path, error = %e, "Failed to remove media file");
        }
    }
}

pub(crate) async fn find_photo<C: ConnectionTrait>(db: &C, id: i32) -> Result<photo::Model, AppError> {
    photo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".into()))
}

/// Map user ids to usernames with a single query.
pub(crate) async fn usernames<C: ConnectionTrait>(
    db: &C,
    mut ids: Vec<i32>,
) -> Result<HashMap<i32, String>, AppError> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
}

async fn photo_page(
    state: &AppState,
    select: Select<photo::Entity>,
    page: u64,
    viewer: Option<i32>,
) -> Result<PhotoListResponse, AppError> {
    let per_page = Ord::max(state.config.media.page_size, 1);

    let paginator = select
        .order_by_desc(photo::Column::CreatedAt)
        .order_by_desc(photo::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let total_pages = total.div_ceil(per_page);
    // Past the last page the listing is empty; never hand sea-orm an offset
    // that would overflow.
    let photos = if page > total_pages {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    let names = usernames(&state.db, photos.iter().map(|p| p.user_id).collect()).await?;
    let data = photos
        .into_iter()
        .map(|p| {
            let name = names.get(&p.user_id).cloned().unwrap_or_default();
            PhotoResponse::new(p, name, viewer)
        })
        .collect();

    Ok(PhotoListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    })
}
