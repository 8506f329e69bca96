//! Background removal by color distance.
//!
//! Sets alpha to zero for every pixel whose RGB value lies within a
//! Euclidean distance threshold of a target color. The smart variant
//! samples the four image corners and averages them, on the assumption
//! that product photos have a roughly uniform backdrop touching every
//! corner.

use crate::color::Rgba;
use crate::types::RgbaImage;

/// Threshold used by [`smart_remove_background`].
pub const SMART_THRESHOLD: f64 = 50.0;

/// Clear the alpha of every pixel within `threshold` Euclidean RGB
/// distance of `target`.
///
/// RGB values are left untouched so the operation is previewable; only
/// alpha changes.
#[must_use = "returns the image with background pixels cleared"]
pub fn remove_background(source: &RgbaImage, target: Rgba, threshold: f64) -> RgbaImage {
    let threshold_sq = threshold * threshold;
    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let dr = f64::from(r) - f64::from(target.r);
        let dg = f64::from(g) - f64::from(target.g);
        let db = f64::from(b) - f64::from(target.b);
        let dist_sq = db.mul_add(db, dr.mul_add(dr, dg * dg));
        if dist_sq < threshold_sq {
            pixel.0[3] = 0;
        }
    }
    out
}

/// Remove the background using the average of the four corner pixels
/// as the target color, with the standard threshold.
///
/// Images too small to have four distinct corners still work — the
/// corner coordinates simply coincide.
#[must_use = "returns the image with background pixels cleared"]
pub fn smart_remove_background(source: &RgbaImage) -> RgbaImage {
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return source.clone();
    }

    let corners = [
        source.get_pixel(0, 0),
        source.get_pixel(w - 1, 0),
        source.get_pixel(0, h - 1),
        source.get_pixel(w - 1, h - 1),
    ];
    let sum = corners.iter().fold([0u32; 3], |mut acc, p| {
        for (slot, &channel) in acc.iter_mut().zip(p.0.iter()) {
            *slot += u32::from(channel);
        }
        acc
    });
    #[allow(clippy::cast_possible_truncation)]
    let target = Rgba::opaque((sum[0] / 4) as u8, (sum[1] / 4) as u8, (sum[2] / 4) as u8);

    remove_background(source, target, SMART_THRESHOLD)
}
