//! Mask-based crop/erase sessions.
//!
//! A [`MaskSession`] holds a single-channel mask with the same
//! dimensions as the source image: 255 marks pixels to keep, 0 marks
//! pixels to discard. The session starts with everything kept,
//! accepts rectangle commits (each one **replaces** the selection) and
//! freehand strokes (**additive**), and composites the mask over the
//! source on apply. Switching between the rectangle and freehand
//! sub-tools preserves the mask; only closing the session discards it.

use imageproc::drawing::draw_filled_circle_mut;

use crate::types::{Dimensions, EngineError, GrayImage, Point, RgbaImage};

/// Mask value for pixels that survive the crop.
pub const KEEP: u8 = 255;
/// Mask value for pixels removed by the crop.
pub const DISCARD: u8 = 0;

/// Smallest accepted freehand brush width, in pixels.
pub const MIN_BRUSH_WIDTH: u32 = 5;
/// Largest accepted freehand brush width, in pixels.
pub const MAX_BRUSH_WIDTH: u32 = 100;
/// Brush width a new session starts with.
pub const DEFAULT_BRUSH_WIDTH: u32 = 30;

/// Dim factor applied to discarded regions in the live preview.
const PREVIEW_DIM: f32 = 0.35;

/// An in-progress mask crop.
///
/// Owned by the crop modal for its lifetime; dropping the session
/// cancels the crop with no effect on editor state.
#[derive(Debug, Clone)]
pub struct MaskSession {
    mask: GrayImage,
    brush_width: u32,
}

impl MaskSession {
    /// Start a session with every pixel selected.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            mask: GrayImage::from_pixel(dimensions.width, dimensions.height, image::Luma([KEEP])),
            brush_width: DEFAULT_BRUSH_WIDTH,
        }
    }

    /// The mask's dimensions (same as the source image).
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.mask.width(),
            height: self.mask.height(),
        }
    }

    /// Current freehand brush width in pixels.
    #[must_use]
    pub const fn brush_width(&self) -> u32 {
        self.brush_width
    }

    /// Set the freehand brush width, clamped to the valid range.
    pub fn set_brush_width(&mut self, width: u32) {
        self.brush_width = width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
    }

    /// Whether the pixel at (x, y) is currently kept.
    ///
    /// Out-of-bounds coordinates count as discarded.
    #[must_use]
    pub fn kept(&self, x: u32, y: u32) -> bool {
        if x >= self.mask.width() || y >= self.mask.height() {
            return false;
        }
        self.mask.get_pixel(x, y).0[0] >= 128
    }

    /// Borrow the raw mask.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Fraction of pixels currently kept, in [0, 1].
    #[must_use]
    pub fn kept_fraction(&self) -> f64 {
        let total = u64::from(self.mask.width()) * u64::from(self.mask.height());
        if total == 0 {
            return 0.0;
        }
        let kept = self.mask.pixels().filter(|p| p.0[0] >= 128).count() as u64;
        #[allow(clippy::cast_precision_loss)]
        {
            kept as f64 / total as f64
        }
    }

    /// Commit a rectangle selection.
    ///
    /// Resets the whole mask to discard, then marks the (clipped)
    /// rectangle as kept — each commit replaces the prior selection
    /// rather than accumulating.
    pub fn commit_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        for p in self.mask.pixels_mut() {
            p.0[0] = DISCARD;
        }

        let (mw, mh) = (f64::from(self.mask.width()), f64::from(self.mask.height()));
        let x0 = x.max(0.0).min(mw);
        let y0 = y.max(0.0).min(mh);
        let x1 = (x + width).max(0.0).min(mw);
        let y1 = (y + height).max(0.0).min(mh);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1.ceil() as u32, y1.ceil() as u32);
        for py in y0..y1.min(self.mask.height()) {
            for px in x0..x1.min(self.mask.width()) {
                self.mask.put_pixel(px, py, image::Luma([KEEP]));
            }
        }
    }

    /// Paint a freehand keep-stroke along a polyline.
    ///
    /// Additive: strokes accumulate on top of whatever is already
    /// selected. Circle stamps are placed at sub-brush spacing along
    /// each segment so fast pointer moves leave no gaps.
    pub fn stroke(&mut self, points: &[Point]) {
        #[allow(clippy::cast_possible_wrap)]
        let radius = (self.brush_width / 2).max(1) as i32;

        match points {
            [] => {}
            [single] => self.stamp(*single, radius),
            _ => {
                for pair in points.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    let length = a.distance(b);
                    let spacing = f64::from(radius).max(1.0) / 2.0;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let steps = (length / spacing).ceil().max(1.0) as u32;
                    for i in 0..=steps {
                        let t = f64::from(i) / f64::from(steps);
                        let p = Point::new(
                            t.mul_add(b.x - a.x, a.x),
                            t.mul_add(b.y - a.y, a.y),
                        );
                        self.stamp(p, radius);
                    }
                }
            }
        }
    }

    fn stamp(&mut self, center: Point, radius: i32) {
        #[allow(clippy::cast_possible_truncation)]
        let c = (center.x.round() as i32, center.y.round() as i32);
        draw_filled_circle_mut(&mut self.mask, c, radius, image::Luma([KEEP]));
    }

    /// Composite the mask over a source buffer.
    ///
    /// Discarded pixels get alpha 0; everything else is copied through.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DimensionMismatch`] if the source does
    /// not match the mask's dimensions. Callers with no source at all
    /// report [`EngineError::MissingSource`] before reaching here.
    pub fn apply(&self, source: &RgbaImage) -> Result<RgbaImage, EngineError> {
        self.check_dimensions(source)?;

        let mut out = source.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if self.mask.get_pixel(x, y).0[0] < 128 {
                pixel.0[3] = 0;
            }
        }
        Ok(out)
    }

    /// Render a live preview: kept regions unchanged, discarded
    /// regions dimmed and desaturated.
    ///
    /// A single O(pixel-count) pass regardless of how many strokes
    /// have been drawn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DimensionMismatch`] if the source does
    /// not match the mask's dimensions.
    pub fn preview(&self, source: &RgbaImage) -> Result<RgbaImage, EngineError> {
        self.check_dimensions(source)?;

        let mut out = source.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if self.mask.get_pixel(x, y).0[0] < 128 {
                let [r, g, b, a] = pixel.0;
                let dimmed = crate::color::luminance(r, g, b) * PREVIEW_DIM;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let v = dimmed.round().clamp(0.0, 255.0) as u8;
                pixel.0 = [v, v, v, a];
            }
        }
        Ok(out)
    }

    fn check_dimensions(&self, source: &RgbaImage) -> Result<(), EngineError> {
        let expected = self.dimensions();
        let actual = Dimensions::of(source);
        if expected == actual {
            Ok(())
        } else {
            Err(EngineError::DimensionMismatch { expected, actual })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn red_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]))
    }

    #[test]
    fn new_session_keeps_everything() {
        let session = MaskSession::new(dims(10, 10));
        assert!((session.kept_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rectangle_commit_replaces_selection() {
        let mut session = MaskSession::new(dims(20, 20));
        session.commit_rectangle(0.0, 0.0, 5.0, 5.0);
        assert!(session.kept(2, 2), "rect A should be kept");

        // A second rectangle discards A's region entirely.
        session.commit_rectangle(10.0, 10.0, 5.0, 5.0);
        assert!(!session.kept(2, 2), "rect A must be discarded after B");
        assert!(session.kept(12, 12), "rect B should be kept");
    }

    #[test]
    fn rectangle_commit_is_clipped_to_bounds() {
        let mut session = MaskSession::new(dims(10, 10));
        session.commit_rectangle(-5.0, -5.0, 100.0, 100.0);
        assert!((session.kept_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degenerate_rectangle_discards_everything() {
        let mut session = MaskSession::new(dims(10, 10));
        session.commit_rectangle(3.0, 3.0, 0.0, 0.0);
        assert!(session.kept_fraction().abs() < f64::EPSILON);
    }

    #[test]
    fn freehand_strokes_are_additive() {
        let mut session = MaskSession::new(dims(100, 100));
        // Start from an empty selection so the strokes are visible.
        session.commit_rectangle(0.0, 0.0, 0.0, 0.0);
        session.set_brush_width(10);

        session.stroke(&[Point::new(10.0, 10.0), Point::new(30.0, 10.0)]);
        session.stroke(&[Point::new(70.0, 70.0), Point::new(90.0, 70.0)]);

        assert!(session.kept(20, 10), "first stroke kept");
        assert!(session.kept(80, 70), "second stroke still kept after first");
        assert!(!session.kept(50, 40), "untouched area stays discarded");
    }

    #[test]
    fn stroke_interpolates_between_distant_points() {
        let mut session = MaskSession::new(dims(100, 20));
        session.commit_rectangle(0.0, 0.0, 0.0, 0.0);
        session.set_brush_width(6);
        // Two points far apart — the midpoint must still be painted.
        session.stroke(&[Point::new(5.0, 10.0), Point::new(95.0, 10.0)]);
        assert!(session.kept(50, 10), "midpoint of the stroke must be kept");
    }

    #[test]
    fn brush_width_clamps() {
        let mut session = MaskSession::new(dims(10, 10));
        session.set_brush_width(1);
        assert_eq!(session.brush_width(), MIN_BRUSH_WIDTH);
        session.set_brush_width(500);
        assert_eq!(session.brush_width(), MAX_BRUSH_WIDTH);
    }

    #[test]
    fn apply_clears_alpha_outside_selection() {
        let mut session = MaskSession::new(dims(10, 10));
        session.commit_rectangle(0.0, 0.0, 5.0, 10.0);
        let out = session.apply(&red_image(10, 10)).unwrap();
        assert_eq!(out.get_pixel(2, 5).0, [255, 0, 0, 255], "kept pixel");
        assert_eq!(out.get_pixel(7, 5).0, [255, 0, 0, 0], "discarded pixel");
    }

    #[test]
    fn apply_rejects_mismatched_source() {
        let session = MaskSession::new(dims(10, 10));
        let result = session.apply(&red_image(5, 5));
        assert!(matches!(
            result,
            Err(EngineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn preview_dims_discarded_regions_only() {
        let mut session = MaskSession::new(dims(10, 10));
        session.commit_rectangle(0.0, 0.0, 5.0, 10.0);
        let preview = session.preview(&red_image(10, 10)).unwrap();
        assert_eq!(
            preview.get_pixel(2, 5).0,
            [255, 0, 0, 255],
            "kept pixel unchanged"
        );
        let discarded = preview.get_pixel(7, 5).0;
        assert!(
            discarded[0] < 40 && discarded[0] == discarded[1],
            "discarded pixel should be dim gray, got {discarded:?}"
        );
        assert_eq!(discarded[3], 255, "preview never touches alpha");
    }

    #[test]
    fn sub_tool_switch_preserves_mask() {
        // A rectangle commit followed by a freehand stroke keeps both:
        // switching tools is non-destructive.
        let mut session = MaskSession::new(dims(60, 60));
        session.commit_rectangle(0.0, 0.0, 10.0, 10.0);
        session.stroke(&[Point::new(40.0, 40.0)]);
        assert!(session.kept(5, 5), "rectangle selection survives");
        assert!(session.kept(40, 40), "stroke selection added");
    }
}
