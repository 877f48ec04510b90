pub mod photo;
pub mod photo_comment;
pub mod user;
