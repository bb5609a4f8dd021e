//! Render context and preview-mode types.

use kurbo::Size;
use stampa_core::Rgba;
use thiserror::Error;

/// Renderer errors.
///
/// Asset failures inside a scene walk are recovered with a placeholder and
/// never surface here; these variants cover context setup and export
/// encoding.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Asset load failed: {0}")]
    AssetLoad(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Milliseconds between animation steps. The driving timer lives outside the
/// renderer and must be cancelled when playback pauses or the view goes away.
pub const ANIMATION_TICK_MS: u64 = 500;

/// What the preview is simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// On-product look: soft drop shadows under elements.
    #[default]
    Realistic,
    /// Print proof: only printable elements, registration marks in the
    /// corners.
    Print,
    /// Marketing mockup: perspective shadow under the product.
    Mockup,
    /// Animated preview: elements bob on a sinusoidal offset.
    Animation,
}

impl PreviewMode {
    pub fn name(self) -> &'static str {
        match self {
            PreviewMode::Realistic => "Realistic",
            PreviewMode::Print => "Print",
            PreviewMode::Mockup => "Mockup",
            PreviewMode::Animation => "Animation",
        }
    }
}

/// What the design is composited over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backdrop {
    #[default]
    White,
    /// Checkerboard pattern standing in for transparency.
    Transparent,
    /// Dark studio gray.
    Dark,
    /// Vertical violet gradient.
    Gradient,
}

impl Backdrop {
    /// Edge length of one checkerboard cell in surface pixels.
    pub const CHECKER_SIZE: u32 = 20;

    pub fn dark_color() -> Rgba {
        Rgba::opaque(0x1f, 0x29, 0x37)
    }

    pub fn gradient_stops() -> (Rgba, Rgba) {
        (Rgba::opaque(0x66, 0x7e, 0xea), Rgba::opaque(0x76, 0x4a, 0xb2))
    }
}

/// Animation playback state, advanced by an external timer every
/// [`ANIMATION_TICK_MS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationTimeline {
    pub step: u32,
    pub playing: bool,
}

impl AnimationTimeline {
    /// Advance one tick. The step counter wraps to keep offsets bounded.
    pub fn tick(&mut self) {
        if self.playing {
            self.step = (self.step + 1) % 10;
        }
    }

    /// Vertical offset in surface pixels for the element at `index`.
    pub fn offset_for(&self, index: usize) -> f64 {
        (self.step as f64 * 0.5 + index as f64 * 0.3).sin() * 10.0
    }
}

/// Resolves image element URLs to raw encoded bytes.
///
/// Inline base64 payloads take precedence; the provider is only consulted
/// for elements without one.
pub trait ImageProvider {
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

/// Context for a single render invocation.
pub struct RenderContext<'a> {
    /// Target buffer size in physical pixels.
    pub target_size: Size,
    /// Surface-to-target scale factor.
    pub zoom: f64,
    pub mode: PreviewMode,
    pub backdrop: Backdrop,
    pub timeline: AnimationTimeline,
    /// Draw soft shadows in realistic mode.
    pub shadows: bool,
    /// Resolver for image element sources.
    pub images: Option<&'a dyn ImageProvider>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context for a target of `target_size` pixels.
    pub fn new(target_size: Size) -> Self {
        Self {
            target_size,
            zoom: 1.0,
            mode: PreviewMode::default(),
            backdrop: Backdrop::default(),
            timeline: AnimationTimeline::default(),
            shadows: true,
            images: None,
        }
    }

    /// Set the surface-to-target scale factor.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the preview mode.
    pub fn with_mode(mut self, mode: PreviewMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the backdrop.
    pub fn with_backdrop(mut self, backdrop: Backdrop) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Set the animation timeline state.
    pub fn with_timeline(mut self, timeline: AnimationTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Enable or disable realistic-mode shadows.
    pub fn with_shadows(mut self, shadows: bool) -> Self {
        self.shadows = shadows;
        self
    }

    /// Set the image source resolver.
    pub fn with_images(mut self, provider: &'a dyn ImageProvider) -> Self {
        self.images = Some(provider);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_wraps_and_pauses() {
        let mut timeline = AnimationTimeline {
            step: 9,
            playing: true,
        };
        timeline.tick();
        assert_eq!(timeline.step, 0);

        timeline.playing = false;
        timeline.tick();
        assert_eq!(timeline.step, 0);
    }

    #[test]
    fn test_offset_is_deterministic_per_step() {
        let timeline = AnimationTimeline {
            step: 3,
            playing: true,
        };
        let expected = (3.0f64 * 0.5 + 2.0 * 0.3).sin() * 10.0;
        assert!((timeline.offset_for(2) - expected).abs() < 1e-12);
        assert_eq!(timeline.offset_for(2), timeline.offset_for(2));
        assert!(timeline.offset_for(0).abs() <= 10.0);
    }

    #[test]
    fn test_context_builders() {
        let ctx = RenderContext::new(Size::new(400.0, 600.0))
            .with_zoom(2.0)
            .with_mode(PreviewMode::Print)
            .with_backdrop(Backdrop::Dark)
            .with_shadows(false);
        assert_eq!(ctx.zoom, 2.0);
        assert_eq!(ctx.mode, PreviewMode::Print);
        assert_eq!(ctx.backdrop, Backdrop::Dark);
        assert!(!ctx.shadows);
    }
}
