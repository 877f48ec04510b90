use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub const LOGIN_PATH: &str = "/accounts/login/";

/// Characters escaped in a `next` query value; path separators stay readable.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// `302 Found` pointing at `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// Redirect to the login page, remembering where the user was headed.
pub fn login_redirect(next: &str) -> Response {
    found(&format!(
        "{LOGIN_PATH}?next={}",
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    ))
}

/// Resolve a post-login `next` target. Only local absolute paths are
/// followed; anything else (`//evil.com`, `https://...`, control characters)
/// falls back to `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n)
            if n.starts_with('/')
                && !n.starts_with("//")
                && !n.contains('\\')
                && !n.chars().any(|c| c.is_ascii_control()) =>
        {
            n
        }
        _ => "/",
    }
}
