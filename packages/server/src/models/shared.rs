use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Prefix stored in front of an edited message or comment.
pub const EDITED_MARKER: &str = "(edited)";

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 15)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 4)]
    pub total_pages: u64,
}

/// Query parameters for paginated photo lists.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Prepend the edit marker unless the text already carries it, so repeated
/// edits never stack markers.
pub fn mark_edited(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with(EDITED_MARKER) {
        trimmed.to_string()
    } else if trimmed.is_empty() {
        EDITED_MARKER.to_string()
    } else {
        format!("{EDITED_MARKER} {trimmed}")
    }
}

/// Public URL for a relative media path.
pub fn media_url(path: &str) -> String {
    format!("/media/{path}")
}

/// Validate free text (caption or comment) length.
pub fn validate_text(text: &str, field: &str, max: usize) -> Result<(), AppError> {
    if text.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
