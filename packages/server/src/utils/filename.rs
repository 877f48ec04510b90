/// Reasons an uploaded file's client-supplied name is rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    TooLong,
    /// Contains `/` or `\`.
    ContainsPathSeparator,
    /// Null bytes or other ASCII control characters (CR/LF in particular).
    ControlCharacter,
    /// Starts with a dot.
    Hidden,
    /// No extension to pick the image format from.
    MissingExtension,
}

const MAX_FILENAME_LEN: usize = 255;

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Choose a file to upload",
            Self::TooLong => "Filename must be at most 255 bytes",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::MissingExtension => "Filename must have an image extension",
        }
    }
}

/// Validates the name a client gave its uploaded file and returns it trimmed.
///
/// The name never reaches the filesystem as-is (see `upload_name`), but a bad
/// one is still reported instead of being silently rewritten.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }
    match trimmed.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(trimmed),
        _ => Err(FilenameError::MissingExtension),
    }
}
