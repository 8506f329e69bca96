//! Numeric image adjustments: brightness, contrast, saturation, blur.
//!
//! Adjustments are cumulative across channels but last-write-wins per
//! channel: the editor stores one value per channel and replays the
//! whole set from the pristine snapshot in a fixed order
//! (brightness → contrast → saturation → blur) whenever any value
//! changes, so the order a user touches the sliders in never affects
//! the result.
//!
//! Numeric semantics:
//! - brightness adds a constant to each RGB channel, clamped to [0, 255]
//! - contrast scales around the 128 midpoint by `(value + 100) / 100`
//! - saturation blends each pixel toward its Rec.601 luminance by
//!   `(value + 100) / 100`
//! - blur is a square box filter of the given radius (see
//!   [`crate::blur`])
//!
//! Alpha is preserved untouched by every step.

use serde::{Deserialize, Serialize};

use crate::blur::box_blur;
use crate::color::luminance;
use crate::types::RgbaImage;

/// Lower bound for the slider-driven channels.
pub const MIN_ADJUST: i32 = -100;
/// Upper bound for the slider-driven channels.
pub const MAX_ADJUST: i32 = 100;
/// Largest accepted blur radius in pixels.
pub const MAX_BLUR_RADIUS: u32 = 20;

/// One adjustable channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustChannel {
    /// Additive brightness offset.
    Brightness,
    /// Contrast scale around the midpoint.
    Contrast,
    /// Saturation blend toward luminance.
    Saturation,
    /// Box blur radius.
    Blur,
}

/// The current value of every adjustment channel.
///
/// `Default` is the identity (no visual change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjustments {
    /// Brightness offset in [-100, 100].
    pub brightness: i32,
    /// Contrast value in [-100, 100]; factor is `(v + 100) / 100`.
    pub contrast: i32,
    /// Saturation value in [-100, 100]; factor is `(v + 100) / 100`.
    pub saturation: i32,
    /// Box blur radius in [0, 20] pixels.
    pub blur: u32,
}

impl Adjustments {
    /// Set one channel, clamping to its valid range.
    ///
    /// Replaces any prior value for the channel (last-write-wins).
    pub fn set(&mut self, channel: AdjustChannel, value: i32) {
        match channel {
            AdjustChannel::Brightness => self.brightness = value.clamp(MIN_ADJUST, MAX_ADJUST),
            AdjustChannel::Contrast => self.contrast = value.clamp(MIN_ADJUST, MAX_ADJUST),
            AdjustChannel::Saturation => self.saturation = value.clamp(MIN_ADJUST, MAX_ADJUST),
            AdjustChannel::Blur => {
                #[allow(clippy::cast_sign_loss)]
                {
                    self.blur = (value.max(0) as u32).min(MAX_BLUR_RADIUS);
                }
            }
        }
    }

    /// `true` when no channel changes the image.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 0 && self.saturation == 0 && self.blur == 0
    }
}

/// Replay the full adjustment set against a pristine source buffer.
///
/// Always applies in the fixed order brightness → contrast →
/// saturation → blur; channels at their identity value are skipped.
#[must_use = "returns the adjusted image"]
pub fn apply_adjustments(source: &RgbaImage, adjustments: &Adjustments) -> RgbaImage {
    if adjustments.is_identity() {
        return source.clone();
    }

    let mut current = source.clone();
    if adjustments.brightness != 0 {
        #[allow(clippy::cast_precision_loss)]
        {
            current = shift_brightness(&current, adjustments.brightness as f32);
        }
    }
    if adjustments.contrast != 0 {
        current = scale_contrast(&current, factor_for(adjustments.contrast));
    }
    if adjustments.saturation != 0 {
        current = blend_saturation(&current, factor_for(adjustments.saturation));
    }
    if adjustments.blur > 0 {
        current = box_blur(&current, adjustments.blur);
    }
    current
}

/// Slider value → multiplicative factor: `(value + 100) / 100`.
#[must_use]
pub fn factor_for(value: i32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let v = value as f32;
    (v + 100.0) / 100.0
}

/// Add a constant offset to each RGB channel, clamped to [0, 255].
#[must_use = "returns the adjusted image"]
pub fn shift_brightness(source: &RgbaImage, offset: f32) -> RgbaImage {
    map_rgb(source, |c| f32::from(c) + offset)
}

/// Scale each RGB channel around the 128 midpoint.
#[must_use = "returns the adjusted image"]
pub fn scale_contrast(source: &RgbaImage, factor: f32) -> RgbaImage {
    map_rgb(source, move |c| (f32::from(c) - 128.0).mul_add(factor, 128.0))
}

/// Blend each pixel toward its luminance.
///
/// `factor` = 0 is fully desaturated (grayscale), 1 is unchanged,
/// above 1 oversaturates.
#[must_use = "returns the adjusted image"]
pub fn blend_saturation(source: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let luma = luminance(r, g, b);
        let blend = |c: u8| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                (f32::from(c) - luma)
                    .mul_add(factor, luma)
                    .round()
                    .clamp(0.0, 255.0) as u8
            }
        };
        pixel.0 = [blend(r), blend(g), blend(b), a];
    }
    out
}

/// Apply a scalar function to every RGB channel, preserving alpha.
fn map_rgb(source: &RgbaImage, f: impl Fn(u8) -> f32) -> RgbaImage {
    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let apply = |c: u8| f(c).round().clamp(0.0, 255.0) as u8;
        pixel.0 = [apply(r), apply(g), apply(b), a];
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient_image() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| {
            image::Rgba([(x * 32) as u8, (y * 32) as u8, 128, 255])
        })
    }

    #[test]
    fn default_is_identity() {
        assert!(Adjustments::default().is_identity());
    }

    #[test]
    fn identity_returns_equal_buffer() {
        let img = gradient_image();
        assert_eq!(apply_adjustments(&img, &Adjustments::default()), img);
    }

    #[test]
    fn set_clamps_to_range() {
        let mut adj = Adjustments::default();
        adj.set(AdjustChannel::Brightness, 500);
        assert_eq!(adj.brightness, MAX_ADJUST);
        adj.set(AdjustChannel::Contrast, -500);
        assert_eq!(adj.contrast, MIN_ADJUST);
        adj.set(AdjustChannel::Blur, 9999);
        assert_eq!(adj.blur, MAX_BLUR_RADIUS);
        adj.set(AdjustChannel::Blur, -5);
        assert_eq!(adj.blur, 0);
    }

    #[test]
    fn set_replaces_prior_value() {
        let mut adj = Adjustments::default();
        adj.set(AdjustChannel::Saturation, 40);
        adj.set(AdjustChannel::Saturation, -10);
        assert_eq!(adj.saturation, -10);
    }

    #[test]
    fn brightness_saturates_at_extremes() {
        let img = gradient_image();
        let white = shift_brightness(&img, 1000.0);
        let black = shift_brightness(&img, -1000.0);
        for p in white.pixels() {
            assert_eq!(&p.0[..3], &[255, 255, 255], "expected white, got {:?}", p.0);
            assert_eq!(p.0[3], 255);
        }
        for p in black.pixels() {
            assert_eq!(&p.0[..3], &[0, 0, 0], "expected black, got {:?}", p.0);
            assert_eq!(p.0[3], 255);
        }
    }

    #[test]
    fn contrast_fixes_the_midpoint() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([128, 128, 128, 255]));
        let adjusted = scale_contrast(&img, 1.4);
        for p in adjusted.pixels() {
            assert_eq!(&p.0[..3], &[128, 128, 128]);
        }
    }

    #[test]
    fn contrast_spreads_values_away_from_midpoint() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([100, 160, 128, 255]));
        let adjusted = scale_contrast(&img, 1.5);
        let p = adjusted.get_pixel(0, 0).0;
        assert!(p[0] < 100, "below midpoint should darken, got {}", p[0]);
        assert!(p[1] > 160, "above midpoint should brighten, got {}", p[1]);
    }

    #[test]
    fn zero_saturation_factor_equals_grayscale() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([200, 50, 100, 255]));
        let desaturated = blend_saturation(&img, 0.0);
        let p = desaturated.get_pixel(0, 0).0;
        assert_eq!(p[0], p[1], "channels should be equal, got {p:?}");
        assert_eq!(p[1], p[2], "channels should be equal, got {p:?}");
    }

    #[test]
    fn unit_saturation_factor_is_identity() {
        let img = gradient_image();
        assert_eq!(blend_saturation(&img, 1.0), img);
    }

    #[test]
    fn replay_is_entry_order_independent() {
        // brightness=20 then contrast=10 must equal contrast=10 then
        // brightness=20, both replayed from the same original.
        let img = gradient_image();

        let mut a = Adjustments::default();
        a.set(AdjustChannel::Brightness, 20);
        a.set(AdjustChannel::Contrast, 10);

        let mut b = Adjustments::default();
        b.set(AdjustChannel::Contrast, 10);
        b.set(AdjustChannel::Brightness, 20);

        assert_eq!(apply_adjustments(&img, &a), apply_adjustments(&img, &b));
    }

    #[test]
    fn alpha_survives_every_channel() {
        let img = RgbaImage::from_fn(4, 4, |x, _| image::Rgba([90, 30, 200, (x * 60) as u8]));
        let mut adj = Adjustments::default();
        adj.set(AdjustChannel::Brightness, 50);
        adj.set(AdjustChannel::Contrast, 30);
        adj.set(AdjustChannel::Saturation, -40);
        adj.set(AdjustChannel::Blur, 1);
        let out = apply_adjustments(&img, &adj);
        for (x, y, p) in out.enumerate_pixels() {
            assert_eq!(p.0[3], img.get_pixel(x, y).0[3], "alpha at ({x},{y})");
        }
    }

    #[test]
    fn serde_round_trip() {
        let mut adj = Adjustments::default();
        adj.set(AdjustChannel::Brightness, -3);
        adj.set(AdjustChannel::Blur, 2);
        let json = serde_json::to_string(&adj).unwrap();
        let back: Adjustments = serde_json::from_str(&json).unwrap();
        assert_eq!(adj, back);
    }
}
