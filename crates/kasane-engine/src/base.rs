//! Stand base configuration and silhouette rendering.
//!
//! The base is the acrylic stand's physical footprint, rendered
//! beneath the main image. [`BaseConfig`] is plain serde data with
//! partial-patch writes ([`BaseConfig::apply_patch`]) and
//! full-snapshot reads; [`render`] is a pure function from a config
//! and surface size to pixels.

use serde::{Deserialize, Serialize};
use std::fmt;

use tiny_skia::{PathBuilder, Rect, Transform};

use crate::color::Rgba;
use crate::surface::BufferSurface;
use crate::text::FontStore;
use crate::types::{EngineError, Point, RgbaImage};

/// Corner radius of the rounded-rectangle base, in pixels.
pub const ROUNDED_CORNER_RADIUS: f32 = 16.0;
/// Inner-to-outer radius ratio of the five-point star.
pub const STAR_INNER_RATIO: f64 = 0.5;
/// Padding around a selected base text's dashed outline, per side.
pub const SELECTION_PADDING: f32 = 5.0;
/// Dash pattern of the selection outline.
const SELECTION_DASH: [f32; 2] = [6.0, 4.0];

/// The base silhouette shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseShape {
    /// Plain rectangle.
    #[default]
    Rectangle,
    /// Rectangle with fixed-radius rounded corners.
    Rounded,
    /// Circle inscribed in the base box.
    Circle,
    /// Heart, approximated with cubic Béziers.
    Heart,
    /// Five-point star with alternating inner/outer radius.
    Star,
    /// Customer-supplied outline; renders as a rectangle until the
    /// outline upload flow exists.
    Custom,
}

impl BaseShape {
    /// All shapes in display order.
    pub const ALL: [Self; 6] = [
        Self::Rectangle,
        Self::Rounded,
        Self::Circle,
        Self::Heart,
        Self::Star,
        Self::Custom,
    ];

    /// Display label for the shape picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Rounded => "Rounded",
            Self::Circle => "Circle",
            Self::Heart => "Heart",
            Self::Star => "Star",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for BaseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A two-stop linear gradient fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseGradient {
    /// Top stop.
    pub from: Rgba,
    /// Bottom stop.
    pub to: Rgba,
    /// When `false`, the solid fill color is used instead.
    pub enabled: bool,
}

impl Default for BaseGradient {
    fn default() -> Self {
        Self {
            from: Rgba::WHITE,
            to: BaseConfig::DEFAULT_FILL,
            enabled: false,
        }
    }
}

/// A text label attached to the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseText {
    /// Id unique among this base's texts.
    pub id: u32,
    /// The label content.
    pub content: String,
    /// Center X as a percentage of the surface width.
    pub x_pct: f64,
    /// Center Y as a percentage of the surface height.
    pub y_pct: f64,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family, resolved through the editor's font store.
    pub font_family: String,
    /// Fill color.
    pub color: Rgba,
    /// Rotation in degrees.
    pub rotation_deg: f64,
}

/// The full base configuration.
///
/// Writes are partial ([`apply_patch`](Self::apply_patch)); reads are
/// always the complete current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Selected silhouette.
    pub shape: BaseShape,
    /// Solid fill color, used when the gradient is disabled.
    pub fill: Rgba,
    /// Two-stop gradient fill.
    pub gradient: BaseGradient,
    /// Fill opacity in [0, 1].
    pub opacity: f32,
    /// Base size as a percentage of the render surface.
    pub size_pct: f64,
    /// Text labels drawn over the shape.
    pub texts: Vec<BaseText>,
}

impl BaseConfig {
    /// Default solid fill: a pale acrylic blue.
    pub const DEFAULT_FILL: Rgba = Rgba::opaque(224, 242, 254);
    /// Default base size percentage.
    pub const DEFAULT_SIZE_PCT: f64 = 100.0;

    /// Apply a partial update; untouched fields keep their values.
    ///
    /// Opacity is clamped to [0, 1] and size to (0, 200].
    pub fn apply_patch(&mut self, patch: BasePatch) {
        if let Some(shape) = patch.shape {
            self.shape = shape;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(gradient) = patch.gradient {
            self.gradient = gradient;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(size_pct) = patch.size_pct {
            self.size_pct = size_pct.clamp(1.0, 200.0);
        }
        if let Some(texts) = patch.texts {
            self.texts = texts;
        }
    }

    /// Add a text label at the base center.
    ///
    /// Returns the new label's id.
    pub fn add_text(&mut self, content: &str) -> u32 {
        let id = self.texts.iter().map(|t| t.id).max().map_or(1, |m| m + 1);
        self.texts.push(BaseText {
            id,
            content: content.to_owned(),
            x_pct: 50.0,
            y_pct: 50.0,
            font_size: crate::decoration::DEFAULT_FONT_SIZE,
            font_family: crate::decoration::DEFAULT_FONT_FAMILY.to_owned(),
            color: Rgba::BLACK,
            rotation_deg: 0.0,
        });
        id
    }

    /// Remove a text label.
    ///
    /// Returns `false` for unknown ids.
    pub fn remove_text(&mut self, id: u32) -> bool {
        let before = self.texts.len();
        self.texts.retain(|t| t.id != id);
        self.texts.len() != before
    }

    /// Mutable access to one text label.
    pub fn text_mut(&mut self, id: u32) -> Option<&mut BaseText> {
        self.texts.iter_mut().find(|t| t.id == id)
    }
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            shape: BaseShape::default(),
            fill: Self::DEFAULT_FILL,
            gradient: BaseGradient::default(),
            opacity: 1.0,
            size_pct: Self::DEFAULT_SIZE_PCT,
            texts: Vec::new(),
        }
    }
}

/// A partial base update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasePatch {
    /// New silhouette.
    #[serde(default)]
    pub shape: Option<BaseShape>,
    /// New solid fill.
    #[serde(default)]
    pub fill: Option<Rgba>,
    /// New gradient setup.
    #[serde(default)]
    pub gradient: Option<BaseGradient>,
    /// New opacity.
    #[serde(default)]
    pub opacity: Option<f32>,
    /// New size percentage.
    #[serde(default)]
    pub size_pct: Option<f64>,
    /// Full replacement of the text list.
    #[serde(default)]
    pub texts: Option<Vec<BaseText>>,
}

/// Render the base silhouette and its texts to a transparent buffer.
///
/// The shape is centered, sized to `size_pct` of the surface, and
/// filled with the solid color or gradient at the configured opacity.
/// When `selected_text` names one of the labels, a dashed outline
/// sized to the label's measured metrics (plus padding) is drawn
/// around it.
///
/// # Errors
///
/// Returns [`EngineError::SurfaceAlloc`] for degenerate surface sizes.
pub fn render(
    config: &BaseConfig,
    width: u32,
    height: u32,
    fonts: &FontStore,
    selected_text: Option<u32>,
) -> Result<RgbaImage, EngineError> {
    let mut surface = BufferSurface::new(width, height)?;

    #[allow(clippy::cast_possible_truncation)]
    let (w, h) = (width as f32, height as f32);
    #[allow(clippy::cast_possible_truncation)]
    let scale = (config.size_pct / 100.0) as f32;
    let (shape_w, shape_h) = (w * scale, h * scale);
    let (cx, cy) = (w / 2.0, h / 2.0);

    if let Some(path) = shape_path(config.shape, cx, cy, shape_w, shape_h) {
        if config.gradient.enabled {
            surface.fill_path_gradient(
                &path,
                config.gradient.from,
                config.gradient.to,
                config.opacity,
                Point::new(f64::from(cx), f64::from(cy - shape_h / 2.0)),
                Point::new(f64::from(cx), f64::from(cy + shape_h / 2.0)),
            );
        } else {
            surface.fill_path_solid(&path, config.fill, config.opacity);
        }
    }

    for text in &config.texts {
        let center = Point::new(
            text.x_pct / 100.0 * f64::from(width),
            text.y_pct / 100.0 * f64::from(height),
        );
        surface.draw_text(
            fonts,
            &text.font_family,
            text.font_size,
            text.color,
            center,
            text.rotation_deg,
            &text.content,
        );

        if selected_text == Some(text.id) {
            draw_selection_outline(&mut surface, fonts, text, center);
        }
    }

    Ok(surface.into_image())
}

/// Dashed outline around a selected text, sized to its measured
/// metrics plus [`SELECTION_PADDING`] per side, rotated with the text.
fn draw_selection_outline(
    surface: &mut BufferSurface,
    fonts: &FontStore,
    text: &BaseText,
    center: Point,
) {
    let metrics = fonts.measure(&text.font_family, text.font_size, &text.content);
    let half_w = metrics.width / 2.0 + SELECTION_PADDING;
    let half_h = metrics.height / 2.0 + SELECTION_PADDING;

    #[allow(clippy::cast_possible_truncation)]
    let (cx, cy) = (center.x as f32, center.y as f32);
    let Some(rect) = Rect::from_xywh(cx - half_w, cy - half_h, half_w * 2.0, half_h * 2.0) else {
        return;
    };
    #[allow(clippy::cast_possible_truncation)]
    let rotation = Transform::from_translate(-cx, -cy)
        .post_concat(Transform::from_rotate(text.rotation_deg as f32))
        .post_concat(Transform::from_translate(cx, cy));
    let Some(path) = PathBuilder::from_rect(rect).transform(rotation) else {
        return;
    };

    surface.stroke_path_dashed(&path, Rgba::opaque(51, 153, 255), 1.0, &SELECTION_DASH);
}

/// Build the outline path for a shape centered at (cx, cy).
fn shape_path(shape: BaseShape, cx: f32, cy: f32, w: f32, h: f32) -> Option<tiny_skia::Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let (left, top) = (cx - w / 2.0, cy - h / 2.0);

    match shape {
        BaseShape::Rectangle | BaseShape::Custom => {
            Rect::from_xywh(left, top, w, h).map(PathBuilder::from_rect)
        }
        BaseShape::Rounded => rounded_rect_path(left, top, w, h),
        BaseShape::Circle => PathBuilder::from_circle(cx, cy, w.min(h) / 2.0),
        BaseShape::Heart => heart_path(cx, cy, w, h),
        BaseShape::Star => star_path(cx, cy, w.min(h) / 2.0),
    }
}

fn rounded_rect_path(left: f32, top: f32, w: f32, h: f32) -> Option<tiny_skia::Path> {
    let r = ROUNDED_CORNER_RADIUS.min(w / 2.0).min(h / 2.0);
    let (right, bottom) = (left + w, top + h);

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.quad_to(right, top, right, top + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.quad_to(left, bottom, left, bottom - r);
    pb.line_to(left, top + r);
    pb.quad_to(left, top, left + r, top);
    pb.close();
    pb.finish()
}

/// Classic two-lobe heart from four cubic segments, fitted to the
/// (w, h) box.
fn heart_path(cx: f32, cy: f32, w: f32, h: f32) -> Option<tiny_skia::Path> {
    let top = cy - h / 2.0;
    let dip = h * 0.3;
    let mid = (h + dip) / 2.0;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, top + dip);
    pb.cubic_to(cx, top, cx - w / 2.0, top, cx - w / 2.0, top + dip);
    pb.cubic_to(cx - w / 2.0, top + mid, cx, top + mid, cx, top + h);
    pb.cubic_to(cx, top + mid, cx + w / 2.0, top + mid, cx + w / 2.0, top + dip);
    pb.cubic_to(cx + w / 2.0, top, cx, top, cx, top + dip);
    pb.close();
    pb.finish()
}

/// Five-point star: ten vertices alternating between the outer and
/// inner radius in 36° steps, starting from straight up.
fn star_path(cx: f32, cy: f32, outer: f32) -> Option<tiny_skia::Path> {
    #[allow(clippy::cast_possible_truncation)]
    let inner = outer * STAR_INNER_RATIO as f32;
    let mut pb = PathBuilder::new();
    for i in 0..10u32 {
        #[allow(clippy::cast_precision_loss)]
        let angle = (f64::from(i).mul_add(36.0, -90.0)).to_radians();
        let radius = if i % 2 == 0 { outer } else { inner };
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = (
            (f64::from(radius) * angle.cos()) as f32 + cx,
            (f64::from(radius) * angle.sin()) as f32 + cy,
        );
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}
