//! Stampa Render Library
//!
//! Stateless CPU rasterizer for Stampa design trees: scene walking, shape and
//! text painting, preview-mode effects, device profiles and export encoding.
//! Each render call owns its target buffer and reads an immutable side
//! snapshot, so callers may invoke it concurrently.

pub mod device;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod text;

pub use device::{export, DeviceProfile, ExportFormat};
pub use renderer::{
    AnimationTimeline, Backdrop, ImageProvider, PreviewMode, RenderContext, RenderError,
    RenderResult, ANIMATION_TICK_MS,
};
pub use scene::render_side;
