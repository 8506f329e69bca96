//! Font registry, text measurement, and glyph rasterization.
//!
//! Fonts are injected by the embedding application (the browser app
//! fetches font bytes at startup; native tools load them from disk) —
//! the engine never bundles font assets. When a requested family has
//! not been registered, measurement falls back to a deterministic
//! geometric estimate so hit-testing and selection outlines keep
//! working, and rasterization draws nothing.

use std::collections::HashMap;

use ab_glyph::{FontVec, PxScale};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::color::Rgba;
use crate::types::{EngineError, RgbaImage};

/// Per-character advance of the fallback estimate, in em.
pub const FALLBACK_ADVANCE_EM: f32 = 0.6;
/// Line height of the fallback estimate, in em.
pub const FALLBACK_HEIGHT_EM: f32 = 1.2;

/// Measured extent of a rendered text run, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Advance width.
    pub width: f32,
    /// Line height.
    pub height: f32,
}

/// Registry of font families available for text decorations and base
/// labels.
#[derive(Default)]
pub struct FontStore {
    fonts: HashMap<String, FontVec>,
}

impl std::fmt::Debug for FontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStore")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font family from raw TTF/OTF bytes.
    ///
    /// Re-registering a family replaces the previous font.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::FontParse`] if the bytes are not a
    /// parseable font.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), EngineError> {
        let font = FontVec::try_from_vec(bytes).map_err(|_| EngineError::FontParse {
            family: family.to_owned(),
        })?;
        self.fonts.insert(family.to_owned(), font);
        Ok(())
    }

    /// Whether a family has been registered.
    #[must_use]
    pub fn is_registered(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    /// Measure a text run at the given pixel size.
    ///
    /// Uses real glyph metrics when the family is registered,
    /// otherwise the deterministic geometric estimate.
    #[must_use]
    pub fn measure(&self, family: &str, px: f32, text: &str) -> TextMetrics {
        if text.is_empty() {
            return TextMetrics {
                width: 0.0,
                height: 0.0,
            };
        }

        if let Some(font) = self.fonts.get(family) {
            let (w, h) = text_size(PxScale::from(px), font, text);
            #[allow(clippy::cast_precision_loss)]
            TextMetrics {
                width: w as f32,
                height: h as f32,
            }
        } else {
            #[allow(clippy::cast_precision_loss)]
            let chars = text.chars().count() as f32;
            TextMetrics {
                width: px * FALLBACK_ADVANCE_EM * chars,
                height: px * FALLBACK_HEIGHT_EM,
            }
        }
    }

    /// Draw a text run into a raster buffer at (x, y).
    ///
    /// Returns `false` (drawing nothing) when the family is not
    /// registered; the caller records the skip in its diagnostics.
    pub fn draw(
        &self,
        target: &mut RgbaImage,
        family: &str,
        px: f32,
        color: Rgba,
        x: i32,
        y: i32,
        text: &str,
    ) -> bool {
        let Some(font) = self.fonts.get(family) else {
            return false;
        };
        draw_text_mut(target, color.to_pixel(), x, y, PxScale::from(px), font, text);
        true
    }

    /// Rasterize a text run into its own tightly-sized transparent
    /// buffer, for compositing with an arbitrary transform.
    ///
    /// Returns `None` when the family is not registered or the run is
    /// empty.
    #[must_use]
    pub fn render_run(&self, family: &str, px: f32, color: Rgba, text: &str) -> Option<RgbaImage> {
        if !self.is_registered(family) || text.is_empty() {
            return None;
        }
        let metrics = self.measure(family, px, text);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (w, h) = (
            (metrics.width.ceil() as u32).max(1),
            (metrics.height.ceil() as u32).max(1),
        );
        let mut buffer = RgbaImage::new(w, h);
        self.draw(&mut buffer, family, px, color, 0, 0, text);
        Some(buffer)
    }
}
