//! Upload-time image normalization.
//!
//! Originals larger than [`MAX_ORIGINAL_SIDE`] on their long side are
//! downscaled; every upload gets a thumbnail bounded by [`THUMBNAIL_BOUND`].
//! Everything here is pure CPU work, callers run it on a blocking thread.

use std::io::Cursor;
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Long-side cap for stored originals, in pixels.
pub const MAX_ORIGINAL_SIDE: u32 = 800;
/// Bounding box for thumbnails, in pixels.
pub const THUMBNAIL_BOUND: u32 = 300;
/// Quality used whenever a JPEG is re-encoded.
pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Result of [`normalize_upload`]: the bytes to store for the original and
/// for its thumbnail.
#[derive(Debug)]
pub struct NormalizedUpload {
    pub format: ImageFormat,
    pub original: Vec<u8>,
    pub original_size: (u32, u32),
    /// `false` when the uploaded bytes are stored untouched.
    pub rescaled: bool,
    pub thumbnail: Vec<u8>,
    pub thumbnail_size: (u32, u32),
}

/// Target size for an original, or `None` if it already fits.
///
/// The long side becomes [`MAX_ORIGINAL_SIDE`]; the other side is scaled by
/// the same ratio and truncated.
pub fn scaled_original_size(width: u32, height: u32) -> Option<(u32, u32)> {
    let cap = u64::from(MAX_ORIGINAL_SIDE);
    if width > height {
        if width <= MAX_ORIGINAL_SIDE {
            return None;
        }
        let h = (cap * u64::from(height) / u64::from(width)).max(1);
        Some((MAX_ORIGINAL_SIDE, h as u32))
    } else {
        if height <= MAX_ORIGINAL_SIDE {
            return None;
        }
        let w = (cap * u64::from(width) / u64::from(height)).max(1);
        Some((w as u32, MAX_ORIGINAL_SIDE))
    }
}

/// Thumbnail size fitting `width` x `height` into the thumbnail bounding box.
///
/// Images that already fit keep their size. Otherwise the constrained side
/// becomes the bound and the other side is whichever of floor/ceil keeps the
/// aspect ratio closest (floor on ties, never below 1).
pub fn thumbnail_size(width: u32, height: u32) -> (u32, u32) {
    let bound = THUMBNAIL_BOUND;
    if width <= bound && height <= bound {
        return (width, height);
    }

    let aspect = f64::from(width) / f64::from(height);
    let b = f64::from(bound);

    if aspect <= 1.0 {
        let x = closest(b * aspect, |n| (aspect - n / b).abs());
        (x, bound)
    } else {
        let y = closest(b / aspect, |n| (aspect - b / n).abs());
        (bound, y)
    }
}

fn closest(value: f64, error: impl Fn(f64) -> f64) -> u32 {
    let lo = value.floor().max(1.0);
    let hi = value.ceil().max(1.0);
    let pick = if error(hi) < error(lo) { hi } else { lo };
    pick as u32
}

/// Encoding format for a stored file, chosen from its extension.
pub fn output_format(filename: &str) -> Result<ImageFormat, ImagingError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    match ImageFormat::from_extension(ext) {
        Some(
            format @ (ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::Bmp
            | ImageFormat::WebP),
        ) => Ok(format),
        _ => Err(ImagingError::UnsupportedFormat(ext.to_string())),
    }
}

/// Decode an upload, downscale it if needed and build its thumbnail.
pub fn normalize_upload(bytes: &[u8], filename: &str) -> Result<NormalizedUpload, ImagingError> {
    let started = Instant::now();
    let format = output_format(filename)?;
    let img = image::load_from_memory(bytes).map_err(ImagingError::Decode)?;
    let (width, height) = (img.width(), img.height());

    let (img, original, rescaled) = match scaled_original_size(width, height) {
        Some((w, h)) => {
            let resized = img.resize_exact(w, h, FilterType::Lanczos3);
            let encoded = encode(&resized, format)?;
            (resized, encoded, true)
        }
        None => (img, bytes.to_vec(), false),
    };
    let original_size = (img.width(), img.height());

    let (tw, th) = thumbnail_size(original_size.0, original_size.1);
    let thumb = if (tw, th) == original_size {
        img
    } else {
        img.thumbnail_exact(tw, th)
    };
    let thumbnail = encode(&thumb, format)?;

    tracing::debug!(
        from = ?(width, height),
        to = ?original_size,
        thumbnail = ?(tw, th),
        rescaled,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Normalized upload"
    );

    Ok(NormalizedUpload {
        format,
        original,
        original_size,
        rescaled,
        thumbnail,
        thumbnail_size: (tw, th),
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(ImagingError::Encode)?;
        }
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), format)
                .map_err(ImagingError::Encode)?;
        }
        _ => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), format)
                .map_err(ImagingError::Encode)?;
        }
    }
    Ok(buf)
}
