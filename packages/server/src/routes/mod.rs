use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers::{auth, comment, photo};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(photo_routes(config))
        .merge(comment_routes())
        .merge(account_routes())
}

fn photo_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let pages = OpenApiRouter::new()
        .routes(routes!(photo::list_photos))
        .routes(routes!(photo::list_my_photos))
        .routes(routes!(photo::photo_detail))
        .routes(routes!(photo::edit_photo))
        .routes(routes!(photo::delete_photo));

    let upload = OpenApiRouter::new()
        .routes(routes!(photo::create_photo))
        .layer(photo::upload_body_limit(config.media.max_upload_size));

    pages.merge(upload)
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::create_comment))
        .routes(routes!(comment::edit_comment))
        .routes(routes!(comment::delete_comment))
}

fn account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::signup))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::delete_account))
        .routes(routes!(auth::me))
}
