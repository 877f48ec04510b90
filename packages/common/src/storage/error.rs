use thiserror::Error;

/// Errors that can occur during media storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The relative path was rejected before touching the filesystem.
    #[error("invalid media path: {0}")]
    InvalidPath(&'static str),
}
