//! kasane-bench: CLI tool for composition-pass experimentation and
//! diagnostics.
//!
//! Runs the composition passes on a given image file with
//! configurable parameters, printing detailed per-pass diagnostics.
//! Useful for:
//!
//! - Measuring per-pass durations at print resolution
//! - Comparing filter and adjustment settings
//! - Inspecting the size cap and crop behavior off the browser
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kasane-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use kasane_engine::{
    AdjustChannel, BasePatch, BaseShape, CropRegion, Editor, FilterKind,
};

/// Composition-pass experimentation and diagnostics for kasane.
///
/// Loads an image, applies the requested filter/adjustments/crop,
/// flattens the composition, and prints per-pass timing diagnostics.
#[derive(Parser)]
#[command(name = "kasane-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, GIF, WebP).
    image_path: PathBuf,

    /// Named filter to apply.
    #[arg(long, value_enum, default_value_t = FilterArg::None)]
    filter: FilterArg,

    /// Brightness adjustment (-100 to 100).
    #[arg(long, default_value_t = 0)]
    brightness: i32,

    /// Contrast adjustment (-100 to 100).
    #[arg(long, default_value_t = 0)]
    contrast: i32,

    /// Saturation adjustment (-100 to 100).
    #[arg(long, default_value_t = 0)]
    saturation: i32,

    /// Box blur radius in pixels (0 to 20).
    #[arg(long, default_value_t = 0)]
    blur: i32,

    /// Crop rectangle as `X,Y,WIDTH,HEIGHT` in source pixels.
    #[arg(long, value_name = "X,Y,W,H")]
    crop: Option<String>,

    /// Quarter-turn rotation in degrees (0, 90, 180, 270).
    #[arg(long, default_value_t = 0)]
    rotate: u32,

    /// Preview scale percentage (50 to 200).
    #[arg(long, default_value_t = 100)]
    scale: u32,

    /// Base silhouette drawn beneath the image.
    #[arg(long, value_enum, default_value_t = ShapeArg::Rectangle)]
    base_shape: ShapeArg,

    /// Base size as a percentage of the surface.
    #[arg(long, default_value_t = 100.0)]
    base_size: f64,

    /// Write the flattened composition to this PNG path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print diagnostics as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// CLI mapping of [`FilterKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    None,
    Grayscale,
    Sepia,
    Vintage,
    Invert,
    Brighten,
    Darken,
    HighContrast,
    Blur,
}

impl FilterArg {
    const fn to_kind(self) -> FilterKind {
        match self {
            Self::None => FilterKind::None,
            Self::Grayscale => FilterKind::Grayscale,
            Self::Sepia => FilterKind::Sepia,
            Self::Vintage => FilterKind::Vintage,
            Self::Invert => FilterKind::Invert,
            Self::Brighten => FilterKind::Brighten,
            Self::Darken => FilterKind::Darken,
            Self::HighContrast => FilterKind::HighContrast,
            Self::Blur => FilterKind::Blur,
        }
    }
}

/// CLI mapping of [`BaseShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShapeArg {
    Rectangle,
    Rounded,
    Circle,
    Heart,
    Star,
    Custom,
}

impl ShapeArg {
    const fn to_shape(self) -> BaseShape {
        match self {
            Self::Rectangle => BaseShape::Rectangle,
            Self::Rounded => BaseShape::Rounded,
            Self::Circle => BaseShape::Circle,
            Self::Heart => BaseShape::Heart,
            Self::Star => BaseShape::Star,
            Self::Custom => BaseShape::Custom,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut editor = Editor::default();
    let dims = match editor.load_image(&bytes) {
        Ok(dims) => dims,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "loaded {} ({}x{}, {} bytes)",
        cli.image_path.display(),
        dims.width,
        dims.height,
        bytes.len()
    );

    if let Some(spec) = &cli.crop {
        let region = match parse_crop(spec) {
            Ok(region) => region,
            Err(e) => {
                eprintln!("error: invalid --crop: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = editor.apply_crop_region(&region) {
            eprintln!("error: crop failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    editor.set_filter(cli.filter.to_kind());
    editor.set_adjustment(AdjustChannel::Brightness, cli.brightness);
    editor.set_adjustment(AdjustChannel::Contrast, cli.contrast);
    editor.set_adjustment(AdjustChannel::Saturation, cli.saturation);
    editor.set_adjustment(AdjustChannel::Blur, cli.blur);

    for _ in 0..(cli.rotate / 90) % 4 {
        editor.rotate_cw();
    }
    editor.set_scale_pct(cli.scale);
    editor.set_base_patch(BasePatch {
        shape: Some(cli.base_shape.to_shape()),
        size_pct: Some(cli.base_size),
        ..BasePatch::default()
    });

    let flattened = match editor.export_png() {
        Ok(png) => png,
        Err(e) => {
            eprintln!("error: export failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &cli.output {
        if let Err(e) = std::fs::write(path, &flattened) {
            eprintln!("error: cannot write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        println!("wrote {} ({} bytes)", path.display(), flattened.len());
    }

    if cli.json {
        match serde_json::to_string_pretty(editor.diagnostics()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: cannot serialize diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!();
    println!("{:<20} {:>12} {:>14}", "pass", "duration", "output");
    println!("{:-<20} {:->12} {:->14}", "", "", "");
    for timing in &editor.diagnostics().passes {
        println!(
            "{:<20} {:>9.3} ms {:>8}x{}",
            timing.pass.label(),
            timing.duration.as_secs_f64() * 1000.0,
            timing.output.width,
            timing.output.height,
        );
    }
    println!(
        "{:<20} {:>9.3} ms",
        "total",
        editor.diagnostics().total_duration().as_secs_f64() * 1000.0,
    );

    if !editor.diagnostics().skipped.is_empty() {
        println!();
        println!("skipped operations:");
        for skip in &editor.diagnostics().skipped {
            println!("  {}: {}", skip.operation, skip.reason);
        }
    }

    ExitCode::SUCCESS
}

/// Parse `X,Y,W,H` into a [`CropRegion`].
fn parse_crop(spec: &str) -> Result<CropRegion, String> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected X,Y,W,H; got {} fields", parts.len()));
    }
    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| format!("not a number: {part:?}"))?;
    }
    if values[2] <= 0.0 || values[3] <= 0.0 {
        return Err("width and height must be positive".to_owned());
    }
    Ok(CropRegion::new(values[0], values[1], values[2], values[3]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_crop_accepts_four_numbers() {
        let region = parse_crop("10, 20, 300, 400").unwrap();
        assert!((region.x - 10.0).abs() < f64::EPSILON);
        assert!((region.y - 20.0).abs() < f64::EPSILON);
        assert!((region.width - 300.0).abs() < f64::EPSILON);
        assert!((region.height - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_crop_rejects_wrong_arity() {
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("1,2,3,4,5").is_err());
    }

    #[test]
    fn parse_crop_rejects_non_numbers_and_degenerate_sizes() {
        assert!(parse_crop("a,2,3,4").is_err());
        assert!(parse_crop("0,0,0,10").is_err());
    }
}
