//! Box blur with in-bounds edge handling.
//!
//! A square averaging kernel: each output pixel is the mean of all
//! source pixels within `radius` along both axes. Edge pixels average
//! only the neighbors that exist — no wrapping, no reflection — so a
//! uniform image stays uniform all the way to its corners.
//!
//! Implemented as two separable passes with `f32` accumulation. The
//! horizontal in-bounds count depends only on the column, so
//! normalizing each axis independently produces exactly the 2-D
//! in-bounds average.
//!
//! Alpha is copied from the source untouched; only RGB is blurred.

use crate::types::RgbaImage;

/// Blur an RGBA image with a square box kernel of the given radius.
///
/// A radius of zero returns the image unchanged.
#[must_use = "returns the blurred image"]
pub fn box_blur(image: &RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let (w, h) = (image.width() as usize, image.height() as usize);
    let r = radius as usize;
    let src = image.as_raw();

    // Horizontal pass: RGB only, f32 intermediate.
    let mut horiz = vec![0f32; w * h * 3];
    let mut row_prefix = vec![[0f32; 3]; w + 1];
    for y in 0..h {
        // Prefix sums over the row for O(1) window sums.
        for x in 0..w {
            let s = (y * w + x) * 4;
            for c in 0..3 {
                row_prefix[x + 1][c] = row_prefix[x][c] + f32::from(src[s + c]);
            }
        }
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r).min(w - 1);
            #[allow(clippy::cast_precision_loss)]
            let count = (x1 - x0 + 1) as f32;
            let d = (y * w + x) * 3;
            for c in 0..3 {
                horiz[d + c] = (row_prefix[x1 + 1][c] - row_prefix[x0][c]) / count;
            }
        }
    }

    // Vertical pass: average the horizontal means, write u8.
    let mut out = RgbaImage::new(image.width(), image.height());
    let mut col_prefix = vec![[0f32; 3]; h + 1];
    for x in 0..w {
        for y in 0..h {
            let s = (y * w + x) * 3;
            for c in 0..3 {
                col_prefix[y + 1][c] = col_prefix[y][c] + horiz[s + c];
            }
        }
        for y in 0..h {
            let y0 = y.saturating_sub(r);
            let y1 = (y + r).min(h - 1);
            #[allow(clippy::cast_precision_loss)]
            let count = (y1 - y0 + 1) as f32;
            let src_alpha = src[(y * w + x) * 4 + 3];
            let mut channels = [0u8; 4];
            for c in 0..3 {
                let mean = (col_prefix[y1 + 1][c] - col_prefix[y0][c]) / count;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    channels[c] = mean.round().clamp(0.0, 255.0) as u8;
                }
            }
            channels[3] = src_alpha;
            #[allow(clippy::cast_possible_truncation)]
            out.put_pixel(x as u32, y as u32, image::Rgba(channels));
        }
    }

    out
}
