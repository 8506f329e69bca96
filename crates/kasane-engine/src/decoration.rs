//! Ordered overlay decorations: image motifs and text runs.
//!
//! A [`DecorationLayer`] owns every decoration on the composition.
//! Positions are stored as percentages of the container's rendered
//! box, so the layer is resolution-independent — resizing the canvas
//! never requires repositioning. Stacking is by `z` value with ties
//! broken by insertion order, and ids are monotonic and never reused
//! within a session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Rgba;
use crate::text::FontStore;
use crate::types::{Dimensions, Point};

/// Smallest motif edge after a resize, in pixels.
pub const MIN_MOTIF_SIZE: f64 = 20.0;
/// Font size a new text decoration starts with.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
/// Font family a new text decoration starts with.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
/// Smallest accepted text size after scaling.
const MIN_FONT_SIZE: f32 = 4.0;
/// Largest accepted text size after scaling.
const MAX_FONT_SIZE: f32 = 400.0;

/// Identifier of a decoration, unique within an editor session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DecorationId(u64);

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual style of a text decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family name, resolved through the editor's [`FontStore`].
    pub font_family: String,
    /// Fill color.
    pub color: Rgba,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            color: Rgba::BLACK,
        }
    }
}

/// What a decoration is: a placed asset image or a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecorationKind {
    /// An asset image, referenced by category and filename and
    /// resolved at render time.
    Motif {
        /// Asset category (e.g. "frames", "stickers").
        category: String,
        /// Asset filename within the category.
        asset: String,
        /// Rendered width in pixels.
        width: f64,
        /// Rendered height in pixels.
        height: f64,
    },
    /// A text run.
    Text {
        /// The text content.
        content: String,
        /// Font and color.
        style: TextStyle,
    },
}

/// One positioned overlay object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Session-unique id.
    pub id: DecorationId,
    /// Motif or text payload.
    pub kind: DecorationKind,
    /// Center X as a percentage of the container width.
    pub x_pct: f64,
    /// Center Y as a percentage of the container height.
    pub y_pct: f64,
    /// Rotation in degrees, accumulated modulo 360.
    pub rotation_deg: f64,
    /// Stacking order; higher draws on top, ties break by insertion.
    pub z: i32,
}

impl Decoration {
    /// Center position in pixels for a given container size.
    #[must_use]
    pub fn center_px(&self, container: Dimensions) -> Point {
        Point::new(
            self.x_pct / 100.0 * f64::from(container.width),
            self.y_pct / 100.0 * f64::from(container.height),
        )
    }

    /// Rendered size in pixels.
    ///
    /// Motifs use their declared size; text measures its run at the
    /// current font through `fonts`.
    #[must_use]
    pub fn size_px(&self, fonts: &FontStore) -> (f64, f64) {
        match &self.kind {
            DecorationKind::Motif { width, height, .. } => (*width, *height),
            DecorationKind::Text { content, style } => {
                let metrics = fonts.measure(&style.font_family, style.font_size, content);
                (f64::from(metrics.width), f64::from(metrics.height))
            }
        }
    }

    /// Whether a canvas-pixel point falls inside the decoration's hit
    /// rectangle, taking rotation into account.
    #[must_use]
    pub fn contains(&self, point: Point, container: Dimensions, fonts: &FontStore) -> bool {
        let center = self.center_px(container);
        let (w, h) = self.size_px(fonts);
        if w <= 0.0 || h <= 0.0 {
            return false;
        }

        // Rotate the pointer into the decoration's local frame.
        let theta = -self.rotation_deg.to_radians();
        let (dx, dy) = (point.x - center.x, point.y - center.y);
        let local_x = theta.cos().mul_add(dx, -theta.sin() * dy);
        let local_y = theta.sin().mul_add(dx, theta.cos() * dy);

        local_x.abs() <= w / 2.0 && local_y.abs() <= h / 2.0
    }
}

/// A partial transform update; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPatch {
    /// New center X percentage.
    #[serde(default)]
    pub x_pct: Option<f64>,
    /// New center Y percentage.
    #[serde(default)]
    pub y_pct: Option<f64>,
    /// New absolute rotation in degrees.
    #[serde(default)]
    pub rotation_deg: Option<f64>,
    /// Multiplier applied to motif size or text font size.
    #[serde(default)]
    pub scale: Option<f64>,
}

/// The ordered collection of decorations plus the exclusive selection.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DecorationLayer {
    items: Vec<Decoration>,
    next_id: u64,
    selected: Option<DecorationId>,
}

impl DecorationLayer {
    /// Create an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decorations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when no decorations exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All decorations in insertion order.
    #[must_use]
    pub fn decorations(&self) -> &[Decoration] {
        &self.items
    }

    /// Look up one decoration.
    #[must_use]
    pub fn get(&self, id: DecorationId) -> Option<&Decoration> {
        self.items.iter().find(|d| d.id == id)
    }

    /// Decorations sorted bottom-to-top for rendering: ascending `z`,
    /// ties in insertion order (stable sort).
    #[must_use]
    pub fn render_order(&self) -> Vec<&Decoration> {
        let mut ordered: Vec<&Decoration> = self.items.iter().collect();
        ordered.sort_by_key(|d| d.z);
        ordered
    }

    /// Add a motif decoration at the canvas center.
    ///
    /// Returns the new decoration's id.
    pub fn add_motif(&mut self, category: &str, asset: &str, width: f64, height: f64) -> DecorationId {
        let kind = DecorationKind::Motif {
            category: category.to_owned(),
            asset: asset.to_owned(),
            width: width.max(MIN_MOTIF_SIZE),
            height: height.max(MIN_MOTIF_SIZE),
        };
        self.push(kind)
    }

    /// Add a text decoration at the canvas center.
    ///
    /// Returns the new decoration's id.
    pub fn add_text(&mut self, content: &str, style: TextStyle) -> DecorationId {
        let kind = DecorationKind::Text {
            content: content.to_owned(),
            style,
        };
        self.push(kind)
    }

    fn push(&mut self, kind: DecorationKind) -> DecorationId {
        self.next_id += 1;
        let id = DecorationId(self.next_id);
        let z = self.items.iter().map(|d| d.z).max().map_or(0, |m| m + 1);
        self.items.push(Decoration {
            id,
            kind,
            x_pct: 50.0,
            y_pct: 50.0,
            rotation_deg: 0.0,
            z,
        });
        id
    }

    /// Replace the content of a text decoration.
    ///
    /// Returns `false` for unknown ids or motif decorations.
    pub fn update_text(&mut self, id: DecorationId, content: &str) -> bool {
        self.with_item(id, |d| {
            if let DecorationKind::Text { content: c, .. } = &mut d.kind {
                *c = content.to_owned();
                true
            } else {
                false
            }
        })
    }

    /// Replace the style of a text decoration.
    ///
    /// Returns `false` for unknown ids or motif decorations.
    pub fn update_text_style(&mut self, id: DecorationId, style: TextStyle) -> bool {
        self.with_item(id, |d| {
            if let DecorationKind::Text { style: s, .. } = &mut d.kind {
                *s = style;
                true
            } else {
                false
            }
        })
    }

    /// Apply a partial transform update.
    ///
    /// Returns `false` for unknown ids.
    pub fn update_transform(&mut self, id: DecorationId, patch: TransformPatch) -> bool {
        self.with_item(id, |d| {
            if let Some(x) = patch.x_pct {
                d.x_pct = x;
            }
            if let Some(y) = patch.y_pct {
                d.y_pct = y;
            }
            if let Some(rotation) = patch.rotation_deg {
                d.rotation_deg = rotation.rem_euclid(360.0);
            }
            if let Some(scale) = patch.scale.filter(|s| s.is_finite() && *s > 0.0) {
                match &mut d.kind {
                    DecorationKind::Motif { width, height, .. } => {
                        *width = (*width * scale).max(MIN_MOTIF_SIZE);
                        *height = (*height * scale).max(MIN_MOTIF_SIZE);
                    }
                    DecorationKind::Text { style, .. } => {
                        #[allow(clippy::cast_possible_truncation)]
                        {
                            style.font_size = (style.font_size * scale as f32)
                                .clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
                        }
                    }
                }
            }
            true
        })
    }

    /// Grow or shrink a motif by a drag delta.
    ///
    /// The larger of the horizontal and vertical deltas wins and is
    /// applied to both edges with its sign, preserving the gesture's
    /// feel regardless of direction; both edges clamp at the minimum
    /// size. Returns `false` for unknown ids or text decorations.
    pub fn resize_motif_by(&mut self, id: DecorationId, dx: f64, dy: f64) -> bool {
        self.with_item(id, |d| {
            if let DecorationKind::Motif { width, height, .. } = &mut d.kind {
                let delta = if dx.abs() >= dy.abs() { dx } else { dy };
                *width = (*width + delta).max(MIN_MOTIF_SIZE);
                *height = (*height + delta).max(MIN_MOTIF_SIZE);
                true
            } else {
                false
            }
        })
    }

    /// Rotate a decoration by a delta, accumulating modulo 360.
    ///
    /// Returns `false` for unknown ids.
    pub fn rotate_by(&mut self, id: DecorationId, delta_deg: f64) -> bool {
        self.with_item(id, |d| {
            d.rotation_deg = (d.rotation_deg + delta_deg).rem_euclid(360.0);
            true
        })
    }

    /// Remove a decoration, clearing the selection if it was selected.
    ///
    /// Returns `false` for unknown ids.
    pub fn remove(&mut self, id: DecorationId) -> bool {
        let before = self.items.len();
        self.items.retain(|d| d.id != id);
        let removed = self.items.len() != before;
        if removed && self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    /// Remove whichever decoration is selected (Delete/Backspace).
    ///
    /// Returns the removed id, if any.
    pub fn remove_selected(&mut self) -> Option<DecorationId> {
        let id = self.selected?;
        self.remove(id).then_some(id)
    }

    /// Raise a decoration above everything else: `z` becomes the
    /// current maximum plus one.
    ///
    /// Returns `false` for unknown ids.
    pub fn bring_to_front(&mut self, id: DecorationId) -> bool {
        let Some(top) = self.items.iter().map(|d| d.z).max() else {
            return false;
        };
        self.with_item(id, |d| {
            d.z = top + 1;
            true
        })
    }

    /// Push a decoration below everything else: `z` becomes the
    /// current minimum minus one.
    ///
    /// Returns `false` for unknown ids.
    pub fn send_to_back(&mut self, id: DecorationId) -> bool {
        let Some(bottom) = self.items.iter().map(|d| d.z).min() else {
            return false;
        };
        self.with_item(id, |d| {
            d.z = bottom - 1;
            true
        })
    }

    /// The currently selected decoration, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<DecorationId> {
        self.selected
    }

    /// Select a decoration by id, replacing any prior selection.
    ///
    /// Returns `false` (leaving the selection unchanged) for unknown
    /// ids.
    pub fn select(&mut self, id: DecorationId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Hit-test a canvas-pixel point and select the topmost hit.
    ///
    /// Misses clear the selection. Returns the newly selected id.
    pub fn select_at(
        &mut self,
        point: Point,
        container: Dimensions,
        fonts: &FontStore,
    ) -> Option<DecorationId> {
        let hit = self
            .render_order()
            .iter()
            .rev()
            .find(|d| d.contains(point, container, fonts))
            .map(|d| d.id);
        self.selected = hit;
        hit
    }

    /// Remove every decoration and clear the selection.
    ///
    /// The id counter is preserved so ids are never reused within an
    /// editor session, even across a reset.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    fn with_item(&mut self, id: DecorationId, f: impl FnOnce(&mut Decoration) -> bool) -> bool {
        self.items.iter_mut().find(|d| d.id == id).is_some_and(f)
    }
}
