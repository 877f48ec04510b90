use super::error::StorageError;

/// Validates a relative media path such as `photos/cat_0191c2d4.jpg`.
///
/// Paths are joined onto the media root, so anything that could escape it
/// (absolute paths, `..`, backslashes, empty or hidden segments) is rejected.
pub fn validate_media_path(path: &str) -> Result<&str, StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path cannot be empty"));
    }

    if path.len() > 512 {
        return Err(StorageError::InvalidPath(
            "path exceeds maximum length of 512 characters",
        ));
    }

    if path.contains('\0') {
        return Err(StorageError::InvalidPath("path must not contain null bytes"));
    }

    if path.contains('\\') {
        return Err(StorageError::InvalidPath("path must not contain backslashes"));
    }

    if path.starts_with('/') {
        return Err(StorageError::InvalidPath("path must not start with '/'"));
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(StorageError::InvalidPath("path must not contain empty segments"));
        }
        if segment.starts_with('.') {
            return Err(StorageError::InvalidPath(
                "path segments must not start with '.'",
            ));
        }
    }

    Ok(path)
}
