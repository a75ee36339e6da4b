//! Image preprocessing before transmission.
//!
//! Downscales so the longest edge fits `max_dimension` (aspect preserved)
//! and re-encodes as JPEG at quality 85, bounding both cost and latency.
//! Bytes whose magic does not match a known image format are rejected
//! before an API call is wasted on them.

use std::io::Cursor;
use tracing::debug;

use fovea_core::defaults;
use fovea_core::{Error, Result};

/// Prepared payload: encoded bytes plus their media type.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

/// Validate, downscale, and re-encode raw image bytes for transmission.
pub fn prepare_image(bytes: &[u8], max_dimension: u32) -> Result<PreparedImage> {
    // Magic bytes are authoritative: a file with an image extension but no
    // recognizable signature is garbage, not an image.
    let kind = infer::get(bytes)
        .ok_or_else(|| Error::InvalidInput("unrecognized image payload".to_string()))?;
    if !kind.mime_type().starts_with("image/") {
        return Err(Error::InvalidInput(format!(
            "payload is {}, not an image",
            kind.mime_type()
        )));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageDecode(e.to_string()))?;
    let (w, h) = (img.width(), img.height());

    // Already small enough and already JPEG: pass through unchanged.
    if w.max(h) <= max_dimension && kind.mime_type() == "image/jpeg" {
        return Ok(PreparedImage {
            bytes: bytes.to_vec(),
            media_type: "image/jpeg",
        });
    }

    let img = if w.max(h) > max_dimension {
        debug!(width = w, height = h, max_dimension, "downscaling image");
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel; flatten before encoding.
    let img = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    img.write_to(
        &mut out,
        image::ImageOutputFormat::Jpeg(defaults::JPEG_QUALITY),
    )
    .map_err(|e| Error::ImageDecode(format!("JPEG re-encode failed: {}", e)))?;

    Ok(PreparedImage {
        bytes: out.into_inner(),
        media_type: "image/jpeg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(w, h);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(w, h);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Jpeg(90)).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_rejects_non_image_bytes() {
        let err = prepare_image(b"%PDF-1.4 not an image", 2048).unwrap_err();
        assert!(err.to_string().contains("not an image"));
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        let err = prepare_image(b"random noise", 2048).unwrap_err();
        assert!(err.to_string().contains("unrecognized image payload"));
    }

    #[test]
    fn test_small_jpeg_passes_through() {
        let bytes = jpeg_bytes(100, 80);
        let prepared = prepare_image(&bytes, 2048).unwrap();
        assert_eq!(prepared.media_type, "image/jpeg");
        assert_eq!(prepared.bytes, bytes);
    }

    #[test]
    fn test_png_is_reencoded_as_jpeg() {
        let prepared = prepare_image(&png_bytes(100, 80), 2048).unwrap();
        assert_eq!(prepared.media_type, "image/jpeg");
        let reloaded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (100, 80));
    }

    #[test]
    fn test_oversized_image_is_downscaled_preserving_aspect() {
        let prepared = prepare_image(&png_bytes(400, 200), 100).unwrap();
        let reloaded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(reloaded.width(), 100);
        assert_eq!(reloaded.height(), 50);
    }

    #[test]
    fn test_portrait_image_longest_edge_bound() {
        let prepared = prepare_image(&png_bytes(200, 400), 100).unwrap();
        let reloaded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(reloaded.width(), 50);
        assert_eq!(reloaded.height(), 100);
    }
}
