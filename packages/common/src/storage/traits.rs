use async_trait::async_trait;

use super::error::StorageError;

/// Storage for uploaded media, addressed by relative path
/// (`photos/<name>`, `thumbnails/thumb_<name>`).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write `data` at `path`, creating parent directories as needed.
    /// An existing file at the same path is replaced.
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete the file at `path`.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
