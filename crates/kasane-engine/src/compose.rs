//! One-shot composition pipeline over raw image bytes.
//!
//! [`compose`] is the offload entry point: everything it needs arrives
//! in one serializable [`ComposeSpec`], so a web worker (or a native
//! CLI) can run the expensive pixel passes away from the UI thread and
//! hand back a finished buffer. Decorations and base compositing stay
//! with the [`Editor`](crate::editor::Editor) on the main thread,
//! where fonts and assets live.
//!
//! Pipeline order matches the export data flow: decode → filter →
//! adjustments → optional geometric crop → quarter-turn rotation →
//! scale → size cap.

use serde::{Deserialize, Serialize};

use crate::adjust::{Adjustments, apply_adjustments};
use crate::editor::{MAX_SCALE_PCT, MAX_UPLOAD_BYTES, MIN_SCALE_PCT};
use crate::export::{MAX_EXPORT_DIM, clamp_to_max_dim};
use crate::filter::{FilterKind, apply_filter};
use crate::region::{CropRegion, apply_crop};
use crate::types::{EngineError, RgbaImage};

/// Everything one composition pass needs, in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeSpec {
    /// Named filter to apply.
    pub filter: FilterKind,
    /// Adjustment replay values.
    pub adjustments: Adjustments,
    /// Optional geometric crop, applied after the pixel passes.
    pub crop: Option<CropRegion>,
    /// Quarter-turn rotation in degrees (0, 90, 180, 270).
    pub rotation_deg: u32,
    /// Scale percentage (50–200).
    pub scale_pct: u32,
    /// Output size cap (longest edge).
    pub max_dim: u32,
}

impl Default for ComposeSpec {
    fn default() -> Self {
        Self {
            filter: FilterKind::None,
            adjustments: Adjustments::default(),
            crop: None,
            rotation_deg: 0,
            scale_pct: 100,
            max_dim: MAX_EXPORT_DIM,
        }
    }
}

/// Run the composition pipeline over raw image bytes.
///
/// # Errors
///
/// Returns [`EngineError::EmptyInput`] for empty bytes,
/// [`EngineError::TooLarge`] above the upload limit,
/// [`EngineError::ImageDecode`] for undecodable data, and surface
/// errors from the crop pass.
pub fn compose(image_bytes: &[u8], spec: &ComposeSpec) -> Result<RgbaImage, EngineError> {
    if image_bytes.is_empty() {
        return Err(EngineError::EmptyInput);
    }
    if image_bytes.len() > MAX_UPLOAD_BYTES {
        return Err(EngineError::TooLarge {
            size: image_bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let decoded = image::load_from_memory(image_bytes)?.to_rgba8();

    let mut current = apply_filter(&decoded, spec.filter);
    current = apply_adjustments(&current, &spec.adjustments);

    if let Some(region) = &spec.crop {
        current = apply_crop(&current, region)?;
    }

    current = match spec.rotation_deg % 360 {
        90 => image::imageops::rotate90(&current),
        180 => image::imageops::rotate180(&current),
        270 => image::imageops::rotate270(&current),
        _ => current,
    };

    let scale_pct = spec.scale_pct.clamp(MIN_SCALE_PCT, MAX_SCALE_PCT);
    if scale_pct != 100 {
        let (w, h) = current.dimensions();
        let scale = f64::from(scale_pct) / 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (nw, nh) = (
            ((f64::from(w) * scale).round() as u32).max(1),
            ((f64::from(h) * scale).round() as u32).max(1),
        );
        current = image::imageops::resize(&current, nw, nh, image::imageops::FilterType::Triangle);
    }

    Ok(clamp_to_max_dim(&current, spec.max_dim))
}
