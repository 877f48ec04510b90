/// Directory holding (possibly downscaled) originals.
pub const PHOTOS_DIR: &str = "photos";
/// Directory holding thumbnails.
pub const THUMBNAILS_DIR: &str = "thumbnails";

const THUMBNAIL_PREFIX: &str = "thumb_";
const MAX_STEM_LEN: usize = 64;

/// Builds a collision-free storage name for an uploaded file.
///
/// The stem is reduced to `[A-Za-z0-9_-]`, a short random suffix is appended
/// and the extension is lowercased: `My Cat.JPG` becomes `My_Cat_1a2b3c4d.jpg`.
pub fn upload_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let mut clean: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();
    if clean.is_empty() {
        clean.push_str("photo");
    }

    let simple = uuid::Uuid::now_v7().simple().to_string();
    // The leading v7 bytes are a timestamp; the tail is random.
    let suffix = &simple[simple.len() - 8..];

    match ext {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{clean}_{suffix}.{}", ext.to_ascii_lowercase())
        }
        _ => format!("{clean}_{suffix}"),
    }
}

/// Name of the thumbnail derived from an original's storage name.
pub fn thumbnail_name(name: &str) -> String {
    format!("{THUMBNAIL_PREFIX}{name}")
}
