//! RGBA color values with CSS-hex parsing and luminance helpers.
//!
//! Colors flow through configs (base fill, gradients, text styles)
//! and are serialized as part of order payloads, so the type is plain
//! data with serde support rather than a wrapper around a rendering
//! crate's color.

use serde::{Deserialize, Serialize};

use crate::types::EngineError;

/// An 8-bit-per-channel RGBA color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    /// Create a color from all four channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb`, or `#rrggbbaa`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ColorParse`] if the string is not a hex
    /// color of a supported length.
    pub fn from_hex(s: &str) -> Result<Self, EngineError> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| EngineError::ColorParse(format!("not a hex color: {trimmed:?}")))?;

        let parse_pair = |pair: &str| {
            u8::from_str_radix(pair, 16)
                .map_err(|_| EngineError::ColorParse(format!("invalid hex color: {trimmed:?}")))
        };

        match hex.len() {
            3 => {
                // Short form: #rgb expands to #rrggbb.
                let mut rgb = [0u8; 3];
                for (i, ch) in hex.chars().enumerate() {
                    let n = ch.to_digit(16).ok_or_else(|| {
                        EngineError::ColorParse(format!("invalid hex char: {ch}"))
                    })?;
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        rgb[i] = (n * 17) as u8;
                    }
                }
                Ok(Self::opaque(rgb[0], rgb[1], rgb[2]))
            }
            6 => Ok(Self::opaque(
                parse_pair(&hex[0..2])?,
                parse_pair(&hex[2..4])?,
                parse_pair(&hex[4..6])?,
            )),
            8 => Ok(Self::new(
                parse_pair(&hex[0..2])?,
                parse_pair(&hex[2..4])?,
                parse_pair(&hex[4..6])?,
                parse_pair(&hex[6..8])?,
            )),
            _ => Err(EngineError::ColorParse(format!(
                "unexpected hex length: {trimmed:?}"
            ))),
        }
    }

    /// Format as `#rrggbb` (alpha omitted) or `#rrggbbaa` when
    /// not fully opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }

    /// Convert to the `image` crate's pixel type.
    #[must_use]
    pub const fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// Convert to a `tiny-skia` color.
    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Convert to a `tiny-skia` color with an extra opacity multiplier
    /// applied to the alpha channel.
    #[must_use]
    pub fn to_skia_with_opacity(self, opacity: f32) -> tiny_skia::Color {
        let alpha = (f32::from(self.a) / 255.0 * opacity.clamp(0.0, 1.0) * 255.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, alpha as u8)
    }
}

/// Rec.601 luminance of an RGB triple, in [0, 255].
///
/// Weights 0.2989/0.5870/0.1140 — the same conversion used by the
/// grayscale filter and the saturation adjustment so the two agree.
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.114f32.mul_add(
        f32::from(b),
        0.2989f32.mul_add(f32::from(r), 0.587 * f32::from(g)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_long_form() {
        assert_eq!(Rgba::from_hex("#1a2b3c").unwrap(), Rgba::opaque(26, 43, 60));
    }

    #[test]
    fn parse_short_form_expands() {
        assert_eq!(Rgba::from_hex("#fff").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::from_hex("#f00").unwrap(), Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn parse_with_alpha() {
        assert_eq!(
            Rgba::from_hex("#11223380").unwrap(),
            Rgba::new(17, 34, 51, 128)
        );
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(Rgba::from_hex("  #000  ").unwrap(), Rgba::BLACK);
    }

    #[test]
    fn parse_rejects_missing_hash() {
        assert!(matches!(
            Rgba::from_hex("ffffff"),
            Err(EngineError::ColorParse(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_length() {
        assert!(matches!(
            Rgba::from_hex("#ffff"),
            Err(EngineError::ColorParse(_))
        ));
    }

    #[test]
    fn hex_round_trip() {
        for hex in ["#000000", "#ff8040", "#12345678"] {
            let color = Rgba::from_hex(hex).unwrap();
            assert_eq!(color.to_hex(), hex);
        }
    }

    #[test]
    fn luminance_of_primaries_is_ordered() {
        // Green carries the highest weight, blue the lowest.
        let r = luminance(255, 0, 0);
        let g = luminance(0, 255, 0);
        let b = luminance(0, 0, 255);
        assert!(g > r && r > b, "expected G > R > B, got R={r} G={g} B={b}");
    }

    #[test]
    fn luminance_of_red_matches_grayscale_expectation() {
        // 0.2989 * 255 ≈ 76.2 — the value the grayscale end-to-end
        // test asserts against.
        let v = luminance(255, 0, 0);
        assert!((v - 76.2).abs() < 0.5, "got {v}");
    }

    #[test]
    fn opacity_multiplier_scales_alpha() {
        let c = Rgba::new(10, 20, 30, 200).to_skia_with_opacity(0.5);
        assert!((c.alpha() - 100.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn serde_round_trip() {
        let c = Rgba::new(1, 2, 3, 4);
        let json = serde_json::to_string(&c).unwrap();
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
