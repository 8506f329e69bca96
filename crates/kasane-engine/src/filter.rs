//! Named one-shot filters.
//!
//! Each filter is a pure function from one RGBA buffer to a new one of
//! identical dimensions, with alpha preserved untouched. Filters are
//! non-cumulative by construction: the editor always passes the
//! pristine decoded snapshot, so reapplying the same filter is
//! idempotent and switching filters never stacks them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::adjust::{scale_contrast, shift_brightness};
use crate::blur::box_blur;
use crate::color::luminance;
use crate::types::RgbaImage;

/// Offset applied by [`FilterKind::Brighten`].
pub const BRIGHTEN_OFFSET: f32 = 30.0;
/// Offset applied by [`FilterKind::Darken`].
pub const DARKEN_OFFSET: f32 = -30.0;
/// Contrast slider value for [`FilterKind::HighContrast`]; the factor
/// is `(40 + 100) / 100 = 1.4`, gentler than the classic 259-based
/// contrast curve.
pub const HIGH_CONTRAST_VALUE: i32 = 40;
/// Box blur radius for [`FilterKind::Blur`].
pub const FILTER_BLUR_RADIUS: u32 = 3;

/// The available one-shot filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// No filter; the buffer passes through unchanged.
    #[default]
    None,
    /// Rec.601 grayscale.
    Grayscale,
    /// Classic sepia tone matrix.
    Sepia,
    /// Warm cast with a mild contrast fade.
    Vintage,
    /// Per-channel inversion.
    Invert,
    /// Brightness +30.
    Brighten,
    /// Brightness −30.
    Darken,
    /// Contrast +40 with the gentle midpoint factor.
    HighContrast,
    /// Box blur, radius 3.
    Blur,
}

impl FilterKind {
    /// All filters in display order.
    pub const ALL: [Self; 9] = [
        Self::None,
        Self::Grayscale,
        Self::Sepia,
        Self::Vintage,
        Self::Invert,
        Self::Brighten,
        Self::Darken,
        Self::HighContrast,
        Self::Blur,
    ];

    /// Display label for the filter picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Grayscale => "Grayscale",
            Self::Sepia => "Sepia",
            Self::Vintage => "Vintage",
            Self::Invert => "Invert",
            Self::Brighten => "Brighten",
            Self::Darken => "Darken",
            Self::HighContrast => "High contrast",
            Self::Blur => "Blur",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Apply a named filter to a source buffer, returning a new buffer.
#[must_use = "returns the filtered image"]
pub fn apply_filter(source: &RgbaImage, kind: FilterKind) -> RgbaImage {
    match kind {
        FilterKind::None => source.clone(),
        FilterKind::Grayscale => grayscale(source),
        FilterKind::Sepia => sepia(source),
        FilterKind::Vintage => vintage(source),
        FilterKind::Invert => invert(source),
        FilterKind::Brighten => shift_brightness(source, BRIGHTEN_OFFSET),
        FilterKind::Darken => shift_brightness(source, DARKEN_OFFSET),
        FilterKind::HighContrast => {
            scale_contrast(source, crate::adjust::factor_for(HIGH_CONTRAST_VALUE))
        }
        FilterKind::Blur => box_blur(source, FILTER_BLUR_RADIUS),
    }
}

/// Rec.601 grayscale: every RGB channel becomes the pixel's luminance.
fn grayscale(source: &RgbaImage) -> RgbaImage {
    map_pixels(source, |r, g, b| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let luma = luminance(r, g, b).round().clamp(0.0, 255.0) as u8;
        [luma, luma, luma]
    })
}

/// Classic sepia tone matrix.
fn sepia(source: &RgbaImage) -> RgbaImage {
    map_pixels(source, |r, g, b| {
        let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
        [
            to_channel(0.189f32.mul_add(bf, 0.393f32.mul_add(rf, 0.769 * gf))),
            to_channel(0.168f32.mul_add(bf, 0.349f32.mul_add(rf, 0.686 * gf))),
            to_channel(0.131f32.mul_add(bf, 0.272f32.mul_add(rf, 0.534 * gf))),
        ]
    })
}

/// Warm cast plus a mild fade: boost red/green, pull blue, then relax
/// contrast slightly around the midpoint.
fn vintage(source: &RgbaImage) -> RgbaImage {
    let warmed = map_pixels(source, |r, g, b| {
        [
            to_channel(f32::from(r).mul_add(1.15, 15.0)),
            to_channel(f32::from(g).mul_add(1.05, 5.0)),
            to_channel(f32::from(b) * 0.85),
        ]
    });
    scale_contrast(&warmed, 0.9)
}

/// Per-channel inversion; applying it twice restores the original.
fn invert(source: &RgbaImage) -> RgbaImage {
    map_pixels(source, |r, g, b| [255 - r, 255 - g, 255 - b])
}

fn to_channel(v: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        v.round().clamp(0.0, 255.0) as u8
    }
}

/// Apply an RGB→RGB map to every pixel, preserving alpha.
fn map_pixels(source: &RgbaImage, f: impl Fn(u8, u8, u8) -> [u8; 3]) -> RgbaImage {
    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [nr, ng, nb] = f(r, g, b);
        pixel.0 = [nr, ng, nb, a];
    }
    out
}
