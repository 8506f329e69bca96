//! In-memory 2D drawing surface.
//!
//! [`BufferSurface`] wraps a `tiny-skia` pixmap behind the small set
//! of operations the compositing code needs: clear, affine image
//! draw, path fill (solid or gradient), dashed stroke, and text. The
//! engines stay testable without any real rendering target — a
//! surface is just pixels.
//!
//! `tiny-skia` stores premultiplied alpha; raster buffers in the rest
//! of the engine use straight alpha, so images are converted at the
//! boundary in both directions.

use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, Pixmap, PixmapPaint,
    Shader, SpreadMode, Stroke, StrokeDash, Transform,
};

use crate::color::Rgba;
use crate::text::FontStore;
use crate::types::{Dimensions, EngineError, Point, RgbaImage};

/// Convert a straight-alpha raster buffer into a premultiplied pixmap.
pub(crate) fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap, EngineError> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or(EngineError::SurfaceAlloc { width, height })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Convert a premultiplied pixmap back to a straight-alpha buffer.
pub(crate) fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels().iter()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    out
}

/// An in-memory RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct BufferSurface {
    pixmap: Pixmap,
}

impl BufferSurface {
    /// Allocate a transparent surface.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SurfaceAlloc`] for zero or overflowing
    /// dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(EngineError::SurfaceAlloc { width, height })?;
        Ok(Self { pixmap })
    }

    /// Create a surface pre-filled with an image.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SurfaceAlloc`] for degenerate images.
    pub fn from_image(image: &RgbaImage) -> Result<Self, EngineError> {
        Ok(Self {
            pixmap: pixmap_from_rgba(image)?,
        })
    }

    /// Surface dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
        }
    }

    /// Fill the whole surface with one color.
    pub fn clear(&mut self, color: Rgba) {
        self.pixmap.fill(color.to_skia());
    }

    /// Draw a raster buffer with an arbitrary affine transform,
    /// bilinear-filtered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SurfaceAlloc`] if the source buffer is
    /// degenerate.
    pub fn draw_image(&mut self, image: &RgbaImage, transform: Transform) -> Result<(), EngineError> {
        let source = pixmap_from_rgba(image)?;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    /// Fill a path with a solid color at the given opacity.
    pub fn fill_path_solid(&mut self, path: &Path, color: Rgba, opacity: f32) {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.shader = Shader::SolidColor(color.to_skia_with_opacity(opacity));
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Fill a path with a two-stop linear gradient at the given
    /// opacity.
    ///
    /// Falls back to a solid fill of the `from` color when the
    /// gradient geometry is degenerate (coincident points).
    pub fn fill_path_gradient(
        &mut self,
        path: &Path,
        from: Rgba,
        to: Rgba,
        opacity: f32,
        start: Point,
        end: Point,
    ) {
        #[allow(clippy::cast_possible_truncation)]
        let shader = LinearGradient::new(
            tiny_skia::Point::from_xy(start.x as f32, start.y as f32),
            tiny_skia::Point::from_xy(end.x as f32, end.y as f32),
            vec![
                GradientStop::new(0.0, from.to_skia_with_opacity(opacity)),
                GradientStop::new(1.0, to.to_skia_with_opacity(opacity)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );

        match shader {
            Some(shader) => {
                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.shader = shader;
                self.pixmap.fill_path(
                    path,
                    &paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            None => self.fill_path_solid(path, from, opacity),
        }
    }

    /// Stroke a path with a dashed line.
    pub fn stroke_path_dashed(&mut self, path: &Path, color: Rgba, width: f32, dash: &[f32]) {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.shader = Shader::SolidColor(color.to_skia());
        let stroke = Stroke {
            width,
            dash: StrokeDash::new(dash.to_vec(), 0.0),
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }

    /// Draw a text run centered at `center`, rotated by
    /// `rotation_deg` about its own center.
    ///
    /// Returns `false` (drawing nothing) when the family is not
    /// registered in `fonts`.
    pub fn draw_text(
        &mut self,
        fonts: &FontStore,
        family: &str,
        px: f32,
        color: Rgba,
        center: Point,
        rotation_deg: f64,
        text: &str,
    ) -> bool {
        let Some(run) = fonts.render_run(family, px, color, text) else {
            return false;
        };

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let (half_w, half_h) = (run.width() as f32 / 2.0, run.height() as f32 / 2.0);
        #[allow(clippy::cast_possible_truncation)]
        let transform = Transform::from_translate(-half_w, -half_h)
            .post_concat(Transform::from_rotate(rotation_deg as f32))
            .post_concat(Transform::from_translate(center.x as f32, center.y as f32));

        // The run buffer is known-good; draw_image only fails on
        // degenerate buffers, which render_run never produces.
        self.draw_image(&run, transform).is_ok()
    }

    /// Consume the surface and return its pixels as a straight-alpha
    /// buffer.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        rgba_from_pixmap(&self.pixmap)
    }
}
