mod error;
mod names;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use names::{PHOTOS_DIR, THUMBNAILS_DIR, thumbnail_name, upload_name};
pub use path::validate_media_path;
pub use traits::MediaStore;
