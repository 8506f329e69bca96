//! Unified pointer gesture state machine for decoration manipulation.
//!
//! Mouse and touch input both funnel into the same three entry points
//! (`pointer_down` / `pointer_move` / `pointer_up`), so there is one
//! code path for moving, resizing, and rotating decorations no matter
//! the input modality. The drag offset is captured at gesture start so
//! a decoration never jumps to the pointer on the first move.

use crate::decoration::{DecorationId, DecorationLayer};
use crate::text::FontStore;
use crate::types::{Dimensions, Point};

/// Degrees of rotation per horizontal pixel while the rotate handle is
/// held.
const ROTATE_DEG_PER_PX: f64 = 1.0;

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    /// Empty canvas space; decorations are hit-tested at the pointer.
    Canvas,
    /// A decoration's body.
    Body(DecorationId),
    /// A decoration's resize handle (motifs only).
    ResizeHandle(DecorationId),
    /// A decoration's rotate handle.
    RotateHandle(DecorationId),
}

/// The controller's current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    /// No gesture in progress.
    Idle,
    /// Moving a decoration; the offset keeps the grab point fixed
    /// under the pointer.
    Dragging {
        /// Decoration being moved.
        id: DecorationId,
        /// Pointer-to-center offset captured at gesture start.
        grab_offset: Point,
    },
    /// Resizing a motif.
    Resizing {
        /// Decoration being resized.
        id: DecorationId,
        /// Pointer position at the previous event.
        last: Point,
    },
    /// Rotating a decoration via horizontal pointer movement.
    Rotating {
        /// Decoration being rotated.
        id: DecorationId,
        /// Pointer X at the previous event.
        last_x: f64,
    },
}

/// Pointer gesture state machine over a [`DecorationLayer`].
#[derive(Debug)]
pub struct GestureController {
    phase: GesturePhase,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    /// Create an idle controller.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
        }
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// `true` when no gesture is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, GesturePhase::Idle)
    }

    /// Begin a gesture.
    ///
    /// Selects the pressed decoration (or clears the selection on a
    /// canvas miss) and enters the phase matching the press target.
    pub fn pointer_down(
        &mut self,
        layer: &mut DecorationLayer,
        container: Dimensions,
        fonts: &FontStore,
        pos: Point,
        target: PressTarget,
    ) {
        let begin_drag = |layer: &DecorationLayer, id: DecorationId| {
            layer.get(id).map(|d| {
                let center = d.center_px(container);
                GesturePhase::Dragging {
                    id,
                    grab_offset: Point::new(pos.x - center.x, pos.y - center.y),
                }
            })
        };

        self.phase = match target {
            PressTarget::Canvas => layer
                .select_at(pos, container, fonts)
                .and_then(|id| begin_drag(layer, id))
                .unwrap_or(GesturePhase::Idle),
            PressTarget::Body(id) => {
                if layer.select(id) {
                    begin_drag(layer, id).unwrap_or(GesturePhase::Idle)
                } else {
                    GesturePhase::Idle
                }
            }
            PressTarget::ResizeHandle(id) => {
                if layer.select(id) {
                    GesturePhase::Resizing { id, last: pos }
                } else {
                    GesturePhase::Idle
                }
            }
            PressTarget::RotateHandle(id) => {
                if layer.select(id) {
                    GesturePhase::Rotating { id, last_x: pos.x }
                } else {
                    GesturePhase::Idle
                }
            }
        };
    }

    /// Feed a pointer move into the active gesture.
    ///
    /// A no-op while idle.
    pub fn pointer_move(
        &mut self,
        layer: &mut DecorationLayer,
        container: Dimensions,
        pos: Point,
    ) {
        match self.phase {
            GesturePhase::Idle => {}
            GesturePhase::Dragging { id, grab_offset } => {
                let center = Point::new(pos.x - grab_offset.x, pos.y - grab_offset.y);
                let patch = crate::decoration::TransformPatch {
                    x_pct: Some(center.x / f64::from(container.width) * 100.0),
                    y_pct: Some(center.y / f64::from(container.height) * 100.0),
                    ..crate::decoration::TransformPatch::default()
                };
                layer.update_transform(id, patch);
            }
            GesturePhase::Resizing { id, last } => {
                layer.resize_motif_by(id, pos.x - last.x, pos.y - last.y);
                self.phase = GesturePhase::Resizing { id, last: pos };
            }
            GesturePhase::Rotating { id, last_x } => {
                layer.rotate_by(id, (pos.x - last_x) * ROTATE_DEG_PER_PX);
                self.phase = GesturePhase::Rotating { id, last_x: pos.x };
            }
        }
    }

    /// End the gesture and return to idle.
    pub fn pointer_up(&mut self) {
        self.phase = GesturePhase::Idle;
    }

    /// Delete/Backspace: remove the selected decoration.
    ///
    /// Returns the removed id, if any.
    pub fn key_delete(layer: &mut DecorationLayer) -> Option<DecorationId> {
        layer.remove_selected()
    }
}
