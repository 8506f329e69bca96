//! kasane-engine: Canvas composition engine (sans-IO).
//!
//! The client-side core of the kasane acrylic-stand customizer:
//! image load → mask/geometric crop → per-pixel filters and
//! adjustments → decoration and text overlay → base-shape rendering →
//! flattened PNG export.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! RGBA buffers and returns structured data. Every transform takes a
//! buffer and returns a new one (value semantics), so composition
//! order is deterministic and each engine is testable in isolation.
//! All browser interaction (uploads, workers, order submission) lives
//! in `kasane-io`.

pub mod adjust;
pub mod background;
pub mod base;
pub mod blur;
pub mod color;
pub mod compose;
pub mod decoration;
pub mod diagnostics;
pub mod editor;
pub mod export;
pub mod filter;
pub mod gesture;
pub mod mask;
pub mod region;
pub mod surface;
pub mod text;
pub mod types;

pub use adjust::{AdjustChannel, Adjustments};
pub use base::{BaseConfig, BasePatch, BaseShape, BaseText};
pub use color::Rgba;
pub use compose::{ComposeSpec, compose};
pub use decoration::{Decoration, DecorationId, DecorationKind, DecorationLayer, TextStyle};
pub use diagnostics::EditorDiagnostics;
pub use editor::{AssetResolver, Editor, MAX_UPLOAD_BYTES, StaticAssets};
pub use export::MAX_EXPORT_DIM;
pub use filter::FilterKind;
pub use gesture::{GestureController, GesturePhase, PressTarget};
pub use mask::MaskSession;
pub use region::{CropRegion, Handle};
pub use text::FontStore;
pub use types::{Dimensions, EngineError, GrayImage, Point, RgbaImage};
