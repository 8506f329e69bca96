//! Rectangle crop regions over a rotated/zoomed source image.
//!
//! [`CropRegion`] is the geometric crop tool's state: a rectangle in
//! canvas pixel space plus an optional aspect-ratio lock, a source
//! rotation, and a zoom factor. Handle drags mutate the rectangle;
//! [`apply_crop`] bakes rotation and zoom into the output via an
//! affine draw and clips to the rectangle.

use tiny_skia::Transform;

use crate::surface::BufferSurface;
use crate::types::{Dimensions, EngineError, RgbaImage};

/// Smallest crop rectangle edge, in pixels.
pub const MIN_CROP_SIZE: f64 = 10.0;
/// Smallest accepted zoom factor.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest accepted zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// A drag target on the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// Top-left corner.
    TopLeft,
    /// Top edge.
    Top,
    /// Top-right corner.
    TopRight,
    /// Right edge.
    Right,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom edge.
    Bottom,
    /// Bottom-left corner.
    BottomLeft,
    /// Left edge.
    Left,
    /// The whole rectangle.
    Move,
}

impl Handle {
    const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    const fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    const fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    /// Pure vertical-edge drags drive width from height under an
    /// aspect lock; every other handle drives height from width.
    const fn drives_height(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// The geometric crop tool's state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRegion {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Rectangle width in canvas pixels.
    pub width: f64,
    /// Rectangle height in canvas pixels.
    pub height: f64,
    /// Width-to-height lock; `None` allows free resizing.
    pub locked_aspect: Option<f64>,
    /// Source rotation in degrees, normalized to (-180, 180].
    pub rotation_deg: f64,
    /// Source zoom factor.
    pub zoom: f64,
}

impl CropRegion {
    /// Create a free-aspect region with no rotation or zoom.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            locked_aspect: None,
            rotation_deg: 0.0,
            zoom: 1.0,
        }
    }

    /// A region covering a full source image.
    #[must_use]
    pub fn covering(dimensions: Dimensions) -> Self {
        Self::new(
            0.0,
            0.0,
            f64::from(dimensions.width),
            f64::from(dimensions.height),
        )
    }

    /// Lock or unlock the aspect ratio.
    ///
    /// Locking immediately recomputes the height from the current
    /// width so the rectangle is never momentarily mismatched.
    /// Non-finite or non-positive ratios clear the lock.
    pub fn set_aspect(&mut self, ratio: Option<f64>, bounds: Dimensions) {
        self.locked_aspect = ratio.filter(|r| r.is_finite() && *r > 0.0);
        if let Some(locked) = self.locked_aspect {
            self.height = self.width / locked;
            self.clamp_into(bounds);
        }
    }

    /// Lock the aspect to the source image's native ratio.
    pub fn match_source_aspect(&mut self, source: Dimensions) {
        self.set_aspect(source.aspect_ratio(), source);
    }

    /// Apply a pointer drag to a handle.
    ///
    /// Under an aspect lock the dependent dimension is recomputed on
    /// every call; the rectangle is clamped to the minimum size and
    /// into `bounds` before returning, so intermediate states are
    /// always valid.
    pub fn drag(&mut self, handle: Handle, dx: f64, dy: f64, bounds: Dimensions) {
        let (bw, bh) = (f64::from(bounds.width), f64::from(bounds.height));

        if matches!(handle, Handle::Move) {
            self.x = (self.x + dx).clamp(0.0, (bw - self.width).max(0.0));
            self.y = (self.y + dy).clamp(0.0, (bh - self.height).max(0.0));
            return;
        }

        let mut left = self.x;
        let mut top = self.y;
        let mut right = self.x + self.width;
        let mut bottom = self.y + self.height;

        if handle.moves_left() {
            left = (left + dx).min(right - MIN_CROP_SIZE);
        }
        if handle.moves_right() {
            right = (right + dx).max(left + MIN_CROP_SIZE);
        }
        if handle.moves_top() {
            top = (top + dy).min(bottom - MIN_CROP_SIZE);
        }
        if handle.moves_bottom() {
            bottom = (bottom + dy).max(top + MIN_CROP_SIZE);
        }

        self.x = left;
        self.y = top;
        self.width = right - left;
        self.height = bottom - top;

        if let Some(ratio) = self.locked_aspect {
            if handle.drives_height() {
                self.width = self.height * ratio;
            } else {
                self.height = self.width / ratio;
            }
        }

        self.clamp_into(bounds);
    }

    /// Rotate the source by a delta, wrapping into (-180, 180].
    pub fn rotate_by(&mut self, deg: f64) {
        self.rotation_deg = normalize_angle(self.rotation_deg + deg);
    }

    /// Quick-rotate 90° clockwise.
    pub fn quick_rotate_cw(&mut self) {
        self.rotate_by(90.0);
    }

    /// Quick-rotate 90° counter-clockwise.
    pub fn quick_rotate_ccw(&mut self) {
        self.rotate_by(-90.0);
    }

    /// Set the zoom factor, clamped to the accepted range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn clamp_into(&mut self, bounds: Dimensions) {
        let (bw, bh) = (f64::from(bounds.width), f64::from(bounds.height));

        if self.width > bw {
            self.width = bw;
            if let Some(ratio) = self.locked_aspect {
                self.height = self.width / ratio;
            }
        }
        if self.height > bh {
            self.height = bh;
            if let Some(ratio) = self.locked_aspect {
                self.width = self.height * ratio;
            }
        }
        self.width = self.width.max(MIN_CROP_SIZE.min(bw));
        self.height = self.height.max(MIN_CROP_SIZE.min(bh));
        self.x = self.x.clamp(0.0, (bw - self.width).max(0.0));
        self.y = self.y.clamp(0.0, (bh - self.height).max(0.0));
    }
}

/// Wrap an angle in degrees into (-180, 180].
#[must_use]
pub fn normalize_angle(deg: f64) -> f64 {
    let mut wrapped = deg % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Crop a source buffer to a region, baking rotation and zoom in via
/// an affine draw.
///
/// The source is rotated and zoomed about its own center, then the
/// crop rectangle is copied into a new buffer of the region's size.
///
/// # Errors
///
/// Returns [`EngineError::SurfaceAlloc`] if the region or source is
/// degenerate.
pub fn apply_crop(source: &RgbaImage, region: &CropRegion) -> Result<RgbaImage, EngineError> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (out_w, out_h) = (
        (region.width.round().max(1.0)) as u32,
        (region.height.round().max(1.0)) as u32,
    );

    #[allow(clippy::cast_precision_loss)]
    let (cx, cy) = (source.width() as f32 / 2.0, source.height() as f32 / 2.0);
    #[allow(clippy::cast_possible_truncation)]
    let transform = Transform::from_translate(-cx, -cy)
        .post_concat(Transform::from_scale(
            region.zoom as f32,
            region.zoom as f32,
        ))
        .post_concat(Transform::from_rotate(region.rotation_deg as f32))
        .post_concat(Transform::from_translate(cx, cy))
        .post_concat(Transform::from_translate(
            -region.x as f32,
            -region.y as f32,
        ));

    let mut surface = BufferSurface::new(out_w, out_h)?;
    surface.draw_image(source, transform)?;
    Ok(surface.into_image())
}
