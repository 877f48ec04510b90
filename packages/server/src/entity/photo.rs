use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE: &str = "no comment";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Restrict")]
    pub user: HasOne<super::user::Entity>,

    /// Relative media path, `photos/<name>`.
    pub pic: String,
    /// Relative media path, `thumbnails/thumb_<name>`.
    pub thumbnail: String,
    #[sea_orm(column_type = "Text", default_value = "no comment")]
    pub message: String,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::photo_comment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
