//! Shared types for the kasane composition engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference raster
/// buffers without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage`; crop masks are single-channel buffers.
pub use image::GrayImage;

/// A 2D point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a raster buffer.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Width-to-height ratio, or `None` for a degenerate buffer.
    #[must_use]
    pub fn aspect_ratio(self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(f64::from(self.width) / f64::from(self.height))
    }
}

/// Errors that can occur inside the composition engine.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits; the `ImageDecode` variant crosses
/// the worker boundary as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input image exceeds the upload size limit.
    #[error("image data is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Actual byte length of the rejected input.
        size: usize,
        /// The configured limit in bytes.
        limit: usize,
    },

    /// An operation that needs a source image ran without one loaded.
    ///
    /// Callers surface this as a retryable error and leave prior
    /// state untouched.
    #[error("no source image loaded")]
    MissingSource,

    /// A mask or overlay buffer does not match the source dimensions.
    #[error("buffer is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        /// Dimensions the operation required.
        expected: Dimensions,
        /// Dimensions actually supplied.
        actual: Dimensions,
    },

    /// A render surface could not be allocated (zero or overflowing size).
    #[error("render surface allocation failed for {width}x{height}")]
    SurfaceAlloc {
        /// Requested surface width.
        width: u32,
        /// Requested surface height.
        height: u32,
    },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    ColorParse(String),

    /// Font bytes could not be parsed.
    #[error("font data for {family:?} could not be parsed")]
    FontParse {
        /// Font family the bytes were registered under.
        family: String,
    },

    /// PNG encoding of the flattened composition failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    /// A malformed message crossed the worker boundary.
    #[error("worker protocol error: {0}")]
    Protocol(String),
}

/// Serde-compatible proxy for `EngineError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead. A deserialized
/// `ImageDecode` is reconstructed as `PngEncode`-style stringly error
/// carrying the original message.
#[derive(Serialize, Deserialize)]
enum EngineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    TooLarge { size: usize, limit: usize },
    MissingSource,
    DimensionMismatch { expected: Dimensions, actual: Dimensions },
    SurfaceAlloc { width: u32, height: u32 },
    ColorParse(String),
    FontParse { family: String },
    PngEncode(String),
    Protocol(String),
}

impl Serialize for EngineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => EngineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => EngineErrorProxy::EmptyInput,
            Self::TooLarge { size, limit } => EngineErrorProxy::TooLarge {
                size: *size,
                limit: *limit,
            },
            Self::MissingSource => EngineErrorProxy::MissingSource,
            Self::DimensionMismatch { expected, actual } => EngineErrorProxy::DimensionMismatch {
                expected: *expected,
                actual: *actual,
            },
            Self::SurfaceAlloc { width, height } => EngineErrorProxy::SurfaceAlloc {
                width: *width,
                height: *height,
            },
            Self::ColorParse(s) => EngineErrorProxy::ColorParse(s.clone()),
            Self::FontParse { family } => EngineErrorProxy::FontParse {
                family: family.clone(),
            },
            Self::PngEncode(s) => EngineErrorProxy::PngEncode(s.clone()),
            Self::Protocol(s) => EngineErrorProxy::Protocol(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EngineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = EngineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The original typed image error cannot be reconstructed;
            // preserve the message in a stringly variant.
            EngineErrorProxy::ImageDecode(msg) => {
                Self::PngEncode(format!("image decode error: {msg}"))
            }
            EngineErrorProxy::EmptyInput => Self::EmptyInput,
            EngineErrorProxy::TooLarge { size, limit } => Self::TooLarge { size, limit },
            EngineErrorProxy::MissingSource => Self::MissingSource,
            EngineErrorProxy::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            EngineErrorProxy::SurfaceAlloc { width, height } => {
                Self::SurfaceAlloc { width, height }
            }
            EngineErrorProxy::ColorParse(s) => Self::ColorParse(s),
            EngineErrorProxy::FontParse { family } => Self::FontParse { family },
            EngineErrorProxy::PngEncode(s) => Self::PngEncode(s),
            EngineErrorProxy::Protocol(s) => Self::Protocol(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dimensions_of_matches_buffer() {
        let img = RgbaImage::new(17, 31);
        assert_eq!(
            Dimensions::of(&img),
            Dimensions {
                width: 17,
                height: 31
            }
        );
    }

    #[test]
    fn aspect_ratio_of_degenerate_buffer_is_none() {
        let d = Dimensions {
            width: 10,
            height: 0,
        };
        assert!(d.aspect_ratio().is_none());
    }

    #[test]
    fn aspect_ratio_square_is_one() {
        let d = Dimensions {
            width: 64,
            height: 64,
        };
        assert!((d.aspect_ratio().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn error_missing_source_display() {
        assert_eq!(
            EngineError::MissingSource.to_string(),
            "no source image loaded"
        );
    }

    #[test]
    fn error_too_large_display_carries_sizes() {
        let err = EngineError::TooLarge {
            size: 11,
            limit: 10,
        };
        assert_eq!(err.to_string(), "image data is 11 bytes, limit is 10");
    }

    #[test]
    fn error_serde_round_trip_missing_source() {
        let json = serde_json::to_string(&EngineError::MissingSource).unwrap();
        let back: EngineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, EngineError::MissingSource));
    }

    #[test]
    fn error_serde_round_trip_dimension_mismatch() {
        let err = EngineError::DimensionMismatch {
            expected: Dimensions {
                width: 2,
                height: 2,
            },
            actual: Dimensions {
                width: 3,
                height: 3,
            },
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: EngineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            EngineError::DimensionMismatch { expected, .. }
            if expected.width == 2
        ));
    }

    #[test]
    fn error_serde_image_decode_preserves_message() {
        let err = EngineError::ImageDecode(image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::GenericFeature("x".into()),
            ),
        ));
        let json = serde_json::to_string(&err).unwrap();
        let back: EngineError = serde_json::from_str(&json).unwrap();
        assert!(back.to_string().contains("image decode error"));
    }

    #[test]
    fn dimensions_serde_round_trip() {
        let d = Dimensions {
            width: 640,
            height: 480,
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: Dimensions = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
