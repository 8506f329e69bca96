//! The composition orchestrator.
//!
//! [`Editor`] owns the single mutable editor state: the committed
//! source buffer, the active filter and adjustments, rotation/scale,
//! the base config, and the decoration layer. Tools never share
//! canvas buffers — they are handed the current buffer and return a
//! new one, and only the editor commits results.
//!
//! Two kinds of image state:
//!
//! - the **pristine** buffer is the committed source of truth: the
//!   decoded upload, rewritten by destructive commits (mask apply,
//!   geometric crop, background removal);
//! - the **working** buffer is `adjustments(filter(pristine))`,
//!   recomputed from scratch whenever the filter or any adjustment
//!   changes, which is what makes filters non-cumulative and
//!   adjustment replay order-independent.
//!
//! Crop/mask sessions are owned by their modal; dropping one without
//! calling the apply method discards all in-progress state with no
//! side effect here.

use std::collections::HashMap;

use tiny_skia::Transform;

use crate::adjust::{AdjustChannel, Adjustments, apply_adjustments};
use crate::background;
use crate::base::{BaseConfig, BasePatch};
use crate::color::Rgba;
use crate::decoration::{DecorationKind, DecorationLayer};
use crate::diagnostics::{EditorDiagnostics, PassKind, Stopwatch};
use crate::export;
use crate::filter::{FilterKind, apply_filter};
use crate::mask::MaskSession;
use crate::region::{CropRegion, apply_crop};
use crate::surface::BufferSurface;
use crate::text::FontStore;
use crate::types::{Dimensions, EngineError, RgbaImage};

/// Upload size limit: 10 MB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Smallest preview scale percentage.
pub const MIN_SCALE_PCT: u32 = 50;
/// Largest preview scale percentage.
pub const MAX_SCALE_PCT: u32 = 200;
/// Preview scale a fresh editor starts with.
pub const DEFAULT_SCALE_PCT: u32 = 100;

/// Resolves motif asset references to pixels.
///
/// Injected into the editor by the application root (browser fetch,
/// disk read, or an in-memory map in tests) — there is no ambient
/// asset registry.
pub trait AssetResolver {
    /// Look up an asset's pixels by category and filename.
    fn resolve(&self, category: &str, asset: &str) -> Option<RgbaImage>;
}

/// Resolver with no assets; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _category: &str, _asset: &str) -> Option<RgbaImage> {
        None
    }
}

/// In-memory asset map, filled by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    assets: HashMap<(String, String), RgbaImage>,
}

impl StaticAssets {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset's pixels.
    pub fn insert(&mut self, category: &str, asset: &str, image: RgbaImage) {
        self.assets
            .insert((category.to_owned(), asset.to_owned()), image);
    }
}

impl AssetResolver for StaticAssets {
    fn resolve(&self, category: &str, asset: &str) -> Option<RgbaImage> {
        self.assets
            .get(&(category.to_owned(), asset.to_owned()))
            .cloned()
    }
}

/// The composition editor.
pub struct Editor {
    pristine: Option<RgbaImage>,
    working: Option<RgbaImage>,
    filter: FilterKind,
    adjustments: Adjustments,
    rotation_deg: u32,
    scale_pct: u32,
    base: BaseConfig,
    selected_base_text: Option<u32>,
    decorations: DecorationLayer,
    fonts: FontStore,
    assets: Box<dyn AssetResolver>,
    diagnostics: EditorDiagnostics,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Box::new(NoAssets))
    }
}

impl Editor {
    /// Create an empty editor with the given asset resolver.
    #[must_use]
    pub fn new(assets: Box<dyn AssetResolver>) -> Self {
        Self {
            pristine: None,
            working: None,
            filter: FilterKind::None,
            adjustments: Adjustments::default(),
            rotation_deg: 0,
            scale_pct: DEFAULT_SCALE_PCT,
            base: BaseConfig::default(),
            selected_base_text: None,
            decorations: DecorationLayer::new(),
            fonts: FontStore::new(),
            assets,
            diagnostics: EditorDiagnostics::default(),
        }
    }

    // --- image lifecycle ------------------------------------------------

    /// Load an image from raw bytes, replacing any current image and
    /// resetting filter, adjustments, rotation, and scale.
    ///
    /// Validation happens before any state changes: on error the
    /// editor is exactly as it was.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyInput`] for empty bytes,
    /// [`EngineError::TooLarge`] above the 10 MB limit,
    /// [`EngineError::ImageDecode`] for undecodable data.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<Dimensions, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(EngineError::TooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let sw = Stopwatch::start();
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let dims = Dimensions::of(&decoded);
        self.diagnostics.record(PassKind::Decode, sw.elapsed(), dims);

        self.pristine = Some(decoded.clone());
        self.working = Some(decoded);
        self.filter = FilterKind::None;
        self.adjustments = Adjustments::default();
        self.rotation_deg = 0;
        self.scale_pct = DEFAULT_SCALE_PCT;
        Ok(dims)
    }

    /// Whether an image is loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.pristine.is_some()
    }

    /// Dimensions of the committed source image.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.pristine.as_ref().map(Dimensions::of)
    }

    /// The current working buffer (filter and adjustments applied).
    #[must_use]
    pub const fn working_image(&self) -> Option<&RgbaImage> {
        self.working.as_ref()
    }

    /// Clear the image and restore every default: no filter, identity
    /// adjustments, rotation 0, scale 100%, default base, no
    /// decorations.
    pub fn reset(&mut self) {
        self.pristine = None;
        self.working = None;
        self.filter = FilterKind::None;
        self.adjustments = Adjustments::default();
        self.rotation_deg = 0;
        self.scale_pct = DEFAULT_SCALE_PCT;
        self.base = BaseConfig::default();
        self.selected_base_text = None;
        self.decorations.clear();
    }

    // --- rotation and scale ---------------------------------------------

    /// Preview rotation in degrees, always a multiple of 90 in
    /// [0, 360).
    #[must_use]
    pub const fn rotation_deg(&self) -> u32 {
        self.rotation_deg
    }

    /// Rotate the preview 90° clockwise, wrapping.
    pub fn rotate_cw(&mut self) {
        self.rotation_deg = (self.rotation_deg + 90) % 360;
    }

    /// Rotate the preview 90° counter-clockwise, wrapping.
    pub fn rotate_ccw(&mut self) {
        self.rotation_deg = (self.rotation_deg + 270) % 360;
    }

    /// Preview scale percentage.
    #[must_use]
    pub const fn scale_pct(&self) -> u32 {
        self.scale_pct
    }

    /// Set the preview scale, clamped to 50–200%.
    pub fn set_scale_pct(&mut self, pct: u32) {
        self.scale_pct = pct.clamp(MIN_SCALE_PCT, MAX_SCALE_PCT);
    }

    // --- filter and adjustments -----------------------------------------

    /// The active named filter.
    #[must_use]
    pub const fn filter(&self) -> FilterKind {
        self.filter
    }

    /// Apply a named filter.
    ///
    /// Always recomputed from the pristine snapshot, so filters never
    /// stack and reapplying the same filter is idempotent. Without an
    /// image this is a recorded no-op, not an error.
    pub fn set_filter(&mut self, kind: FilterKind) {
        if self.pristine.is_none() {
            self.diagnostics.record_skip("filter", "no source image");
            return;
        }
        self.filter = kind;
        self.recompute();
    }

    /// The current adjustment values.
    #[must_use]
    pub const fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    /// Set one adjustment channel (last-write-wins) and replay the
    /// whole set from the pristine snapshot.
    ///
    /// Without an image this is a recorded no-op, not an error.
    pub fn set_adjustment(&mut self, channel: AdjustChannel, value: i32) {
        if self.pristine.is_none() {
            self.diagnostics.record_skip("adjust", "no source image");
            return;
        }
        self.adjustments.set(channel, value);
        self.recompute();
    }

    // --- background removal ---------------------------------------------

    /// Clear the background around a target color.
    ///
    /// Commits into the pristine snapshot (like a crop). Without an
    /// image this is a recorded no-op.
    pub fn remove_background(&mut self, target: Rgba, threshold: f64) {
        let Some(pristine) = self.pristine.as_ref() else {
            self.diagnostics
                .record_skip("background remove", "no source image");
            return;
        };
        let sw = Stopwatch::start();
        let cleared = background::remove_background(pristine, target, threshold);
        self.diagnostics.record(
            PassKind::BackgroundRemove,
            sw.elapsed(),
            Dimensions::of(&cleared),
        );
        self.pristine = Some(cleared);
        self.recompute();
    }

    /// Clear the background using the corner-sampled target color.
    ///
    /// Without an image this is a recorded no-op.
    pub fn smart_remove_background(&mut self) {
        let Some(pristine) = self.pristine.as_ref() else {
            self.diagnostics
                .record_skip("background remove", "no source image");
            return;
        };
        let sw = Stopwatch::start();
        let cleared = background::smart_remove_background(pristine);
        self.diagnostics.record(
            PassKind::BackgroundRemove,
            sw.elapsed(),
            Dimensions::of(&cleared),
        );
        self.pristine = Some(cleared);
        self.recompute();
    }

    // --- crop sessions --------------------------------------------------

    /// Start a mask crop session sized to the current image.
    ///
    /// The session is owned by the caller; dropping it cancels the
    /// crop with no effect on the editor.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image.
    pub fn begin_mask_session(&self) -> Result<MaskSession, EngineError> {
        self.dimensions()
            .map(MaskSession::new)
            .ok_or(EngineError::MissingSource)
    }

    /// Commit a mask session: discarded pixels become transparent in
    /// the pristine snapshot and the working image is recomputed.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image;
    /// [`EngineError::DimensionMismatch`] if the session does not
    /// match the image (prior state is left untouched).
    pub fn apply_mask(&mut self, session: &MaskSession) -> Result<(), EngineError> {
        let pristine = self.pristine.as_ref().ok_or(EngineError::MissingSource)?;
        let sw = Stopwatch::start();
        let masked = session.apply(pristine)?;
        self.diagnostics
            .record(PassKind::MaskApply, sw.elapsed(), Dimensions::of(&masked));
        self.pristine = Some(masked);
        self.recompute();
        Ok(())
    }

    /// Start a geometric crop covering the whole current image.
    ///
    /// The region is owned by the caller; dropping it cancels the
    /// crop with no effect on the editor.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image.
    pub fn begin_crop(&self) -> Result<CropRegion, EngineError> {
        self.dimensions()
            .map(CropRegion::covering)
            .ok_or(EngineError::MissingSource)
    }

    /// Commit a geometric crop: rotation and zoom are baked in and
    /// the pristine snapshot is replaced by the cropped buffer.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image; surface
    /// errors leave prior state untouched.
    pub fn apply_crop_region(&mut self, region: &CropRegion) -> Result<Dimensions, EngineError> {
        let pristine = self.pristine.as_ref().ok_or(EngineError::MissingSource)?;
        let sw = Stopwatch::start();
        let cropped = apply_crop(pristine, region)?;
        let dims = Dimensions::of(&cropped);
        self.diagnostics
            .record(PassKind::CropApply, sw.elapsed(), dims);
        self.pristine = Some(cropped);
        self.recompute();
        Ok(dims)
    }

    // --- base and decorations -------------------------------------------

    /// Full snapshot of the base configuration.
    #[must_use]
    pub fn base_config(&self) -> BaseConfig {
        self.base.clone()
    }

    /// Partial-patch update of the base configuration.
    pub fn set_base_patch(&mut self, patch: BasePatch) {
        self.base.apply_patch(patch);
    }

    /// Mutable access to the base configuration (text management).
    pub fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }

    /// Select a base text for outline display, or clear with `None`.
    pub fn select_base_text(&mut self, id: Option<u32>) {
        self.selected_base_text = id.filter(|id| self.base.texts.iter().any(|t| t.id == *id));
    }

    /// The base text currently selected for outline display.
    #[must_use]
    pub const fn selected_base_text(&self) -> Option<u32> {
        self.selected_base_text
    }

    /// The decoration layer.
    #[must_use]
    pub const fn decorations(&self) -> &DecorationLayer {
        &self.decorations
    }

    /// Mutable access to the decoration layer.
    pub fn decorations_mut(&mut self) -> &mut DecorationLayer {
        &mut self.decorations
    }

    /// The font registry.
    #[must_use]
    pub const fn fonts(&self) -> &FontStore {
        &self.fonts
    }

    /// Mutable access to the font registry.
    pub fn fonts_mut(&mut self) -> &mut FontStore {
        &mut self.fonts
    }

    /// Diagnostics accumulated so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &EditorDiagnostics {
        &self.diagnostics
    }

    // --- rendering ------------------------------------------------------

    /// Render the preview: the working image rotated and scaled.
    ///
    /// A pure function of (working image, rotation, scale), recomputed
    /// from scratch on every call — there is no incremental redraw to
    /// get out of sync.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image.
    pub fn preview(&self) -> Result<RgbaImage, EngineError> {
        let working = self.working.as_ref().ok_or(EngineError::MissingSource)?;

        let rotated = match self.rotation_deg {
            90 => image::imageops::rotate90(working),
            180 => image::imageops::rotate180(working),
            270 => image::imageops::rotate270(working),
            _ => working.clone(),
        };

        if self.scale_pct == 100 {
            return Ok(rotated);
        }
        let (w, h) = rotated.dimensions();
        let scale = f64::from(self.scale_pct) / 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (nw, nh) = (
            ((f64::from(w) * scale).round() as u32).max(1),
            ((f64::from(h) * scale).round() as u32).max(1),
        );
        Ok(image::imageops::resize(
            &rotated,
            nw,
            nh,
            image::imageops::FilterType::Triangle,
        ))
    }

    /// Flatten the full composition: base beneath, then the preview
    /// image, then decorations bottom-to-top, capped to `max_dim`.
    ///
    /// Selection outlines never appear in a flatten — it is the print
    /// artifact, not a screen state.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] without an image; surface
    /// errors propagate.
    pub fn flatten(&mut self, max_dim: u32) -> Result<RgbaImage, EngineError> {
        let sw = Stopwatch::start();
        let image = self.preview()?;
        let dims = Dimensions::of(&image);

        let base_layer =
            crate::base::render(&self.base, dims.width, dims.height, &self.fonts, None)?;
        let mut surface = BufferSurface::from_image(&base_layer)?;
        surface.draw_image(&image, Transform::identity())?;

        let mut skips: Vec<(String, String)> = Vec::new();
        for decoration in self.decorations.render_order() {
            let center = decoration.center_px(dims);
            match &decoration.kind {
                DecorationKind::Motif {
                    category,
                    asset,
                    width,
                    height,
                } => {
                    let Some(pixels) = self.assets.resolve(category, asset) else {
                        skips.push((
                            format!("motif {category}/{asset}"),
                            "asset not resolvable".to_owned(),
                        ));
                        continue;
                    };
                    if pixels.width() == 0 || pixels.height() == 0 {
                        skips.push((
                            format!("motif {category}/{asset}"),
                            "degenerate asset".to_owned(),
                        ));
                        continue;
                    }
                    #[allow(clippy::cast_precision_loss)]
                    let (iw, ih) = (pixels.width() as f32, pixels.height() as f32);
                    #[allow(clippy::cast_possible_truncation)]
                    let transform = Transform::from_translate(-iw / 2.0, -ih / 2.0)
                        .post_concat(Transform::from_scale(
                            (*width / f64::from(iw)) as f32,
                            (*height / f64::from(ih)) as f32,
                        ))
                        .post_concat(Transform::from_rotate(decoration.rotation_deg as f32))
                        .post_concat(Transform::from_translate(
                            center.x as f32,
                            center.y as f32,
                        ));
                    surface.draw_image(&pixels, transform)?;
                }
                DecorationKind::Text { content, style } => {
                    let drawn = surface.draw_text(
                        &self.fonts,
                        &style.font_family,
                        style.font_size,
                        style.color,
                        center,
                        decoration.rotation_deg,
                        content,
                    );
                    if !drawn {
                        skips.push((
                            format!("text {}", decoration.id),
                            format!("font {:?} not registered", style.font_family),
                        ));
                    }
                }
            }
        }
        for (operation, reason) in skips {
            self.diagnostics.record_skip(&operation, &reason);
        }

        let flat = export::clamp_to_max_dim(&surface.into_image(), max_dim);
        self.diagnostics
            .record(PassKind::Flatten, sw.elapsed(), Dimensions::of(&flat));
        Ok(flat)
    }

    /// Flatten at the print cap and encode as PNG bytes.
    ///
    /// # Errors
    ///
    /// Propagates flatten and encoding errors.
    pub fn export_png(&mut self) -> Result<Vec<u8>, EngineError> {
        let flat = self.flatten(export::MAX_EXPORT_DIM)?;
        let sw = Stopwatch::start();
        let bytes = export::encode_png(&flat)?;
        self.diagnostics
            .record(PassKind::Encode, sw.elapsed(), Dimensions::of(&flat));
        Ok(bytes)
    }

    /// Flatten at the print cap and encode as a PNG data URL for the
    /// order-submission boundary.
    ///
    /// # Errors
    ///
    /// Propagates flatten and encoding errors.
    pub fn export_data_url(&mut self) -> Result<String, EngineError> {
        let flat = self.flatten(export::MAX_EXPORT_DIM)?;
        let sw = Stopwatch::start();
        let url = export::to_data_url(&flat)?;
        self.diagnostics
            .record(PassKind::Encode, sw.elapsed(), Dimensions::of(&flat));
        Ok(url)
    }

    /// Recompute the working buffer from the pristine snapshot:
    /// filter first, then the adjustment replay.
    fn recompute(&mut self) {
        let Some(pristine) = self.pristine.clone() else {
            self.working = None;
            return;
        };

        let mut current = pristine;
        if self.filter != FilterKind::None {
            let sw = Stopwatch::start();
            current = apply_filter(&current, self.filter);
            self.diagnostics
                .record(PassKind::Filter, sw.elapsed(), Dimensions::of(&current));
        }
        if !self.adjustments.is_identity() {
            let sw = Stopwatch::start();
            current = apply_adjustments(&current, &self.adjustments);
            self.diagnostics
                .record(PassKind::Adjust, sw.elapsed(), Dimensions::of(&current));
        }
        self.working = Some(current);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decoration::TextStyle;

    /// Encode a uniform RGBA image as PNG bytes.
    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        crate::export::encode_png(&img).unwrap()
    }

    fn editor_with_red_image(size: u32) -> Editor {
        let mut editor = Editor::default();
        editor
            .load_image(&png_bytes(size, size, [255, 0, 0, 255]))
            .unwrap();
        editor
    }

    #[test]
    fn load_rejects_empty_input() {
        let mut editor = Editor::default();
        assert!(matches!(
            editor.load_image(&[]),
            Err(EngineError::EmptyInput)
        ));
        assert!(!editor.has_image());
    }

    #[test]
    fn load_rejects_oversized_input_before_decoding() {
        let mut editor = Editor::default();
        let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            editor.load_image(&oversized),
            Err(EngineError::TooLarge { .. })
        ));
        assert!(!editor.has_image());
    }

    #[test]
    fn load_rejects_undecodable_bytes_without_partial_state() {
        let mut editor = Editor::default();
        assert!(matches!(
            editor.load_image(&[0xFF, 0x00, 0x12]),
            Err(EngineError::ImageDecode(_))
        ));
        assert!(!editor.has_image());
        assert!(editor.preview().is_err());
    }

    #[test]
    fn load_resets_edit_state_but_keeps_decorations() {
        let mut editor = editor_with_red_image(10);
        editor.set_filter(FilterKind::Invert);
        editor.rotate_cw();
        editor.set_scale_pct(150);
        let id = editor.decorations_mut().add_text("keep me", TextStyle::default());

        editor
            .load_image(&png_bytes(20, 20, [0, 255, 0, 255]))
            .unwrap();
        assert_eq!(editor.filter(), FilterKind::None);
        assert_eq!(editor.rotation_deg(), 0);
        assert_eq!(editor.scale_pct(), DEFAULT_SCALE_PCT);
        assert!(editor.decorations().get(id).is_some());
    }

    #[test]
    fn filter_without_image_is_recorded_noop() {
        let mut editor = Editor::default();
        editor.set_filter(FilterKind::Grayscale);
        assert_eq!(editor.filter(), FilterKind::None, "filter not applied");
        assert_eq!(editor.diagnostics().skipped.len(), 1);
        assert_eq!(editor.diagnostics().skipped[0].operation, "filter");
    }

    #[test]
    fn adjustment_without_image_is_recorded_noop() {
        let mut editor = Editor::default();
        editor.set_adjustment(AdjustChannel::Brightness, 50);
        assert!(editor.adjustments().is_identity());
        assert_eq!(editor.diagnostics().skipped[0].operation, "adjust");
    }

    #[test]
    fn switching_filters_never_stacks() {
        let mut editor = editor_with_red_image(4);
        editor.set_filter(FilterKind::Invert);
        editor.set_filter(FilterKind::Grayscale);
        // Grayscale of the ORIGINAL red, not of inverted cyan.
        let p = editor.working_image().unwrap().get_pixel(0, 0).0;
        assert!((75..=77).contains(&p[0]), "expected ≈76, got {}", p[0]);
    }

    #[test]
    fn reapplying_a_filter_is_idempotent() {
        let mut editor = editor_with_red_image(4);
        editor.set_filter(FilterKind::Sepia);
        let once = editor.working_image().unwrap().clone();
        editor.set_filter(FilterKind::Sepia);
        assert_eq!(&once, editor.working_image().unwrap());
    }

    #[test]
    fn adjustments_compose_with_filter_from_pristine() {
        let mut editor = editor_with_red_image(4);
        editor.set_adjustment(AdjustChannel::Brightness, 20);
        editor.set_filter(FilterKind::Grayscale);
        editor.set_adjustment(AdjustChannel::Brightness, 10);
        // brightness replays at 10 (last write), over grayscale(red).
        let p = editor.working_image().unwrap().get_pixel(0, 0).0;
        assert!((85..=87).contains(&p[0]), "expected ≈86, got {}", p[0]);
    }

    #[test]
    fn rotation_steps_wrap_both_ways() {
        let mut editor = Editor::default();
        editor.rotate_ccw();
        assert_eq!(editor.rotation_deg(), 270);
        editor.rotate_cw();
        editor.rotate_cw();
        assert_eq!(editor.rotation_deg(), 90);
    }

    #[test]
    fn scale_clamps_to_range() {
        let mut editor = Editor::default();
        editor.set_scale_pct(10);
        assert_eq!(editor.scale_pct(), MIN_SCALE_PCT);
        editor.set_scale_pct(1000);
        assert_eq!(editor.scale_pct(), MAX_SCALE_PCT);
    }

    #[test]
    fn preview_applies_rotation_then_scale() {
        let mut editor = Editor::default();
        let img = RgbaImage::from_pixel(100, 50, image::Rgba([1, 2, 3, 255]));
        editor
            .load_image(&crate::export::encode_png(&img).unwrap())
            .unwrap();

        editor.rotate_cw();
        editor.set_scale_pct(50);
        let preview = editor.preview().unwrap();
        assert_eq!(preview.dimensions(), (25, 50), "rotated then halved");
    }

    #[test]
    fn preview_without_image_is_missing_source() {
        let editor = Editor::default();
        assert!(matches!(
            editor.preview(),
            Err(EngineError::MissingSource)
        ));
    }

    #[test]
    fn mask_session_without_image_is_missing_source() {
        let editor = Editor::default();
        assert!(matches!(
            editor.begin_mask_session(),
            Err(EngineError::MissingSource)
        ));
        assert!(matches!(
            editor.begin_crop(),
            Err(EngineError::MissingSource)
        ));
    }

    #[test]
    fn dropping_a_session_cancels_without_side_effects() {
        let mut editor = editor_with_red_image(10);
        {
            let mut session = editor.begin_mask_session().unwrap();
            session.commit_rectangle(0.0, 0.0, 2.0, 2.0);
            // Modal closed without apply: session dropped here.
        }
        let p = editor.working_image().unwrap().get_pixel(9, 9).0;
        assert_eq!(p, [255, 0, 0, 255], "no pixels were touched");
    }

    #[test]
    fn mask_apply_commits_and_recomputes() {
        let mut editor = editor_with_red_image(10);
        editor.set_filter(FilterKind::Grayscale);

        let mut session = editor.begin_mask_session().unwrap();
        session.commit_rectangle(0.0, 0.0, 5.0, 10.0);
        editor.apply_mask(&session).unwrap();

        let working = editor.working_image().unwrap();
        assert_eq!(working.get_pixel(2, 2).0[3], 255, "kept region opaque");
        assert_eq!(working.get_pixel(7, 2).0[3], 0, "discarded region cleared");
        let p = working.get_pixel(2, 2).0;
        assert_eq!(p[0], p[1], "filter still applied after commit");
    }

    #[test]
    fn mask_apply_failure_leaves_state_untouched() {
        let mut editor = editor_with_red_image(10);
        let stale = MaskSession::new(Dimensions {
            width: 4,
            height: 4,
        });
        assert!(matches!(
            editor.apply_mask(&stale),
            Err(EngineError::DimensionMismatch { .. })
        ));
        assert_eq!(
            editor.dimensions().unwrap(),
            Dimensions {
                width: 10,
                height: 10
            }
        );
        assert_eq!(
            editor.working_image().unwrap().get_pixel(0, 0).0,
            [255, 0, 0, 255]
        );
    }

    #[test]
    fn crop_apply_replaces_dimensions() {
        let mut editor = editor_with_red_image(100);
        let mut region = editor.begin_crop().unwrap();
        region.drag(
            crate::region::Handle::Right,
            -50.0,
            0.0,
            Dimensions {
                width: 100,
                height: 100,
            },
        );
        let dims = editor.apply_crop_region(&region).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 50,
                height: 100
            }
        );
        assert_eq!(editor.dimensions().unwrap(), dims);
    }

    #[test]
    fn smart_background_removal_commits_to_pristine() {
        let mut editor = Editor::default();
        editor
            .load_image(&png_bytes(8, 8, [255, 255, 255, 255]))
            .unwrap();
        editor.smart_remove_background();
        assert_eq!(
            editor.working_image().unwrap().get_pixel(4, 4).0[3],
            0,
            "uniform backdrop fully cleared"
        );
        // A later filter change must not resurrect the background.
        editor.set_filter(FilterKind::Invert);
        assert_eq!(editor.working_image().unwrap().get_pixel(4, 4).0[3], 0);
    }

    #[test]
    fn base_patch_write_and_snapshot_read() {
        let mut editor = Editor::default();
        editor.set_base_patch(BasePatch {
            shape: Some(crate::base::BaseShape::Circle),
            size_pct: Some(150.0),
            ..BasePatch::default()
        });
        let config = editor.base_config();
        assert_eq!(config.shape, crate::base::BaseShape::Circle);
        assert!((config.size_pct - 150.0).abs() < f64::EPSILON);
        // Untouched fields come back with their defaults.
        assert_eq!(config.fill, BaseConfig::DEFAULT_FILL);
        assert!((config.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn base_text_selection_validates_id() {
        let mut editor = Editor::default();
        let id = editor.base_mut().add_text("label");
        editor.select_base_text(Some(id));
        assert_eq!(editor.selected_base_text(), Some(id));
        editor.select_base_text(Some(999));
        assert_eq!(editor.selected_base_text(), None, "unknown id clears");
    }

    #[test]
    fn flatten_shows_base_beneath_transparent_image_regions() {
        let mut editor = editor_with_red_image(20);
        editor.set_base_patch(BasePatch {
            fill: Some(Rgba::opaque(0, 0, 255)),
            ..BasePatch::default()
        });

        // Keep only the left half of the image.
        let mut session = editor.begin_mask_session().unwrap();
        session.commit_rectangle(0.0, 0.0, 10.0, 20.0);
        editor.apply_mask(&session).unwrap();

        let flat = editor.flatten(4096).unwrap();
        assert_eq!(flat.get_pixel(4, 10).0, [255, 0, 0, 255], "image on top");
        assert_eq!(
            flat.get_pixel(15, 10).0,
            [0, 0, 255, 255],
            "base shows through the discarded region"
        );
    }

    #[test]
    fn flatten_draws_resolved_motifs_and_skips_missing_assets() {
        let mut assets = StaticAssets::new();
        assets.insert(
            "stickers",
            "dot.png",
            RgbaImage::from_pixel(10, 10, image::Rgba([0, 255, 0, 255])),
        );
        let mut editor = Editor::new(Box::new(assets));
        editor
            .load_image(&png_bytes(40, 40, [255, 0, 0, 255]))
            .unwrap();

        editor
            .decorations_mut()
            .add_motif("stickers", "dot.png", 20.0, 20.0);
        editor
            .decorations_mut()
            .add_motif("stickers", "missing.png", 20.0, 20.0);

        let flat = editor.flatten(4096).unwrap();
        assert_eq!(flat.get_pixel(20, 20).0, [0, 255, 0, 255], "motif drawn at center");
        assert_eq!(flat.get_pixel(2, 2).0, [255, 0, 0, 255], "image elsewhere");
        assert!(
            editor
                .diagnostics()
                .skipped
                .iter()
                .any(|s| s.operation.contains("missing.png")),
            "unresolvable asset recorded"
        );
    }

    #[test]
    fn flatten_records_missing_font_for_text() {
        let mut editor = editor_with_red_image(20);
        editor
            .decorations_mut()
            .add_text("hello", TextStyle::default());
        let _ = editor.flatten(4096).unwrap();
        assert!(
            editor
                .diagnostics()
                .skipped
                .iter()
                .any(|s| s.reason.contains("not registered")),
            "missing font recorded"
        );
    }

    #[test]
    fn flatten_caps_output_size() {
        let mut editor = editor_with_red_image(100);
        let flat = editor.flatten(64).unwrap();
        assert_eq!(flat.dimensions(), (64, 64));
    }

    #[test]
    fn export_data_url_is_png() {
        let mut editor = editor_with_red_image(8);
        let url = editor.export_data_url().unwrap();
        assert!(url.starts_with(crate::export::PNG_DATA_URL_PREFIX));
    }

    #[test]
    fn reset_restores_defaults_but_never_reuses_ids() {
        let mut editor = editor_with_red_image(8);
        editor.set_filter(FilterKind::Sepia);
        editor.rotate_cw();
        editor.set_scale_pct(150);
        let before = editor
            .decorations_mut()
            .add_text("gone", TextStyle::default());
        editor.set_base_patch(BasePatch {
            shape: Some(crate::base::BaseShape::Star),
            ..BasePatch::default()
        });

        editor.reset();
        assert!(!editor.has_image());
        assert_eq!(editor.filter(), FilterKind::None);
        assert_eq!(editor.rotation_deg(), 0);
        assert_eq!(editor.scale_pct(), DEFAULT_SCALE_PCT);
        assert_eq!(editor.base_config(), BaseConfig::default());
        assert!(editor.decorations().is_empty());

        let after = editor
            .decorations_mut()
            .add_text("new", TextStyle::default());
        assert_ne!(before, after, "ids continue across reset");
    }

    // --- end-to-end scenarios -------------------------------------------

    #[test]
    fn end_to_end_grayscale_then_crop() {
        let mut editor = editor_with_red_image(1000);
        editor.set_filter(FilterKind::Grayscale);

        let working = editor.working_image().unwrap();
        let p = working.get_pixel(500, 500).0;
        assert!((75..=77).contains(&p[0]), "grayscale of red ≈76, got {}", p[0]);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 255);

        let region = CropRegion::new(0.0, 0.0, 500.0, 500.0);
        editor.apply_crop_region(&region).unwrap();

        let flat = editor.flatten(4096).unwrap();
        assert_eq!(flat.dimensions(), (500, 500));
        let q = flat.get_pixel(250, 250).0;
        assert!((75..=77).contains(&q[0]), "still grayscale red, got {}", q[0]);
        assert_eq!(q[3], 255);
    }

    #[test]
    fn end_to_end_text_decoration_lifecycle() {
        let mut editor = editor_with_red_image(10);
        let style = TextStyle {
            font_size: 24.0,
            ..TextStyle::default()
        };
        let id = editor.decorations_mut().add_text("Hello", style);

        let all = editor.decorations().decorations();
        assert_eq!(all.len(), 1);
        let d = &all[0];
        assert!(matches!(
            &d.kind,
            DecorationKind::Text { content, style }
            if content == "Hello" && (style.font_size - 24.0).abs() < f32::EPSILON
        ));
        assert!((d.x_pct - 50.0).abs() < f64::EPSILON);
        assert!((d.y_pct - 50.0).abs() < f64::EPSILON);
        assert!(d.rotation_deg.abs() < f64::EPSILON);

        assert!(editor.decorations_mut().remove(id));
        assert!(editor.decorations().is_empty());
    }

    #[test]
    fn end_to_end_base_partial_patch() {
        let mut editor = Editor::default();
        let before = editor.base_config();
        editor.set_base_patch(BasePatch {
            shape: Some(crate::base::BaseShape::Circle),
            size_pct: Some(150.0),
            ..BasePatch::default()
        });
        let after = editor.base_config();
        assert_eq!(after.shape, crate::base::BaseShape::Circle);
        assert!((after.size_pct - 150.0).abs() < f64::EPSILON);
        assert_eq!(after.fill, before.fill);
        assert_eq!(after.gradient, before.gradient);
        assert!((after.opacity - before.opacity).abs() < f32::EPSILON);
        assert_eq!(after.texts, before.texts);
    }
}
