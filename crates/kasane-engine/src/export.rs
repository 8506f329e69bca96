//! Flattened-export encoding: PNG bytes and base64 data URLs.
//!
//! The export boundary hands the order-submission layer a PNG data
//! URL of the fully flattened composition, capped at print resolution.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder;

use crate::types::{EngineError, RgbaImage};

/// Largest edge of an exported composition, in pixels.
pub const MAX_EXPORT_DIM: u32 = 4096;

/// Prefix of every exported data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Downscale an image so its longest edge fits `max_dim`, preserving
/// aspect ratio. Images already within the cap are returned unchanged.
#[must_use = "returns the size-capped image"]
pub fn clamp_to_max_dim(image: &RgbaImage, max_dim: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest <= max_dim || longest == 0 || max_dim == 0 {
        return image.clone();
    }

    let scale = f64::from(max_dim) / f64::from(longest);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (nw, nh) = (
        ((f64::from(w) * scale).round() as u32).max(1),
        ((f64::from(h) * scale).round() as u32).max(1),
    );
    image::imageops::resize(image, nw, nh, image::imageops::FilterType::Triangle)
}

/// Encode a raster buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`EngineError::PngEncode`] if encoding fails (degenerate
/// dimensions or an encoder error).
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EngineError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| EngineError::PngEncode(e.to_string()))?;
    Ok(png_bytes)
}

/// Encode a raster buffer as a `data:image/png;base64,...` URL.
///
/// # Errors
///
/// Returns [`EngineError::PngEncode`] if PNG encoding fails.
pub fn to_data_url(image: &RgbaImage) -> Result<String, EngineError> {
    let png_bytes = encode_png(image)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&png_bytes)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn within_cap_returns_identical_image() {
        let img = RgbaImage::from_pixel(100, 50, image::Rgba([1, 2, 3, 255]));
        assert_eq!(clamp_to_max_dim(&img, 4096), img);
    }

    #[test]
    fn oversized_image_shrinks_preserving_aspect() {
        let img = RgbaImage::new(8000, 4000);
        let capped = clamp_to_max_dim(&img, 4096);
        assert_eq!(capped.dimensions(), (4096, 2048));
    }

    #[test]
    fn portrait_image_caps_on_height() {
        let img = RgbaImage::new(1000, 5000);
        let capped = clamp_to_max_dim(&img, 4096);
        assert_eq!(capped.dimensions(), (819, 4096));
    }

    #[test]
    fn encode_png_round_trips_through_decoder() {
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            image::Rgba([(x * 60) as u8, (y * 60) as u8, 7, 255])
        });
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn encode_png_rejects_degenerate_image() {
        let img = RgbaImage::new(0, 0);
        assert!(matches!(
            encode_png(&img),
            Err(EngineError::PngEncode(_))
        ));
    }

    #[test]
    fn data_url_has_png_prefix_and_valid_base64() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let url = to_data_url(&img).unwrap();
        let payload = url.strip_prefix(PNG_DATA_URL_PREFIX).unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }
}
