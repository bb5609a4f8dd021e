//! Device profiles and export encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use kurbo::Size;
use log::debug;
use stampa_core::tree::Side;

use crate::renderer::{PreviewMode, RenderContext, RenderError, RenderResult};
use crate::scene::render_side;

/// Reference DPI that design surfaces are authored against.
const BASE_DPI: f64 = 96.0;

/// Output surface the design is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    Mobile,
    Tablet,
    Desktop,
    Print,
}

impl DeviceProfile {
    /// Target buffer dimensions in physical pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            DeviceProfile::Mobile => (375, 667),
            DeviceProfile::Tablet => (768, 1024),
            DeviceProfile::Desktop => (1920, 1080),
            DeviceProfile::Print => (2480, 3508),
        }
    }

    pub fn dpi(self) -> u32 {
        match self {
            DeviceProfile::Mobile => 326,
            DeviceProfile::Tablet => 264,
            DeviceProfile::Desktop => 96,
            DeviceProfile::Print => 300,
        }
    }

    /// Density relative to the 96 dpi authoring reference.
    pub fn scale(self) -> f64 {
        self.dpi() as f64 / BASE_DPI
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceProfile::Mobile => "mobile",
            DeviceProfile::Tablet => "tablet",
            DeviceProfile::Desktop => "desktop",
            DeviceProfile::Print => "print",
        }
    }
}

/// Encoded output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg { quality: u8 },
    /// Encoded losslessly; the quality knob exists for API uniformity with
    /// lossy formats and is ignored.
    WebP { quality: u8 },
}

/// Render one side for a device and encode it.
///
/// The side is scaled uniformly to fit the device dimensions; the backdrop
/// fills whatever the aspect ratio leaves over.
pub fn export(
    side: &Side,
    device: DeviceProfile,
    format: ExportFormat,
    mode: PreviewMode,
) -> RenderResult<Vec<u8>> {
    let (width, height) = device.dimensions();
    let zoom = fit_zoom(side.surface, width, height);
    let ctx = RenderContext::new(Size::new(width as f64, height as f64))
        .with_zoom(zoom)
        .with_mode(mode);
    let image = render_side(side, &ctx);
    debug!(
        "exporting side {:?} for {} at {}x{} (zoom {zoom:.3})",
        side.name,
        device.name(),
        width,
        height
    );
    encode(&image, format)
}

fn fit_zoom(surface: Size, width: u32, height: u32) -> f64 {
    if surface.width <= 0.0 || surface.height <= 0.0 {
        return 1.0;
    }
    (width as f64 / surface.width).min(height as f64 / surface.height)
}

/// Encode a rendered buffer into the requested container.
pub fn encode(image: &RgbaImage, format: ExportFormat) -> RenderResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
        ExportFormat::Jpeg { quality } => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
        ExportFormat::WebP { .. } => {
            WebPEncoder::new_lossless(&mut buffer)
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use stampa_core::element::ShapeKind;
    use stampa_core::Element;

    fn sample_side() -> Side {
        let mut side = Side::new("front", Size::new(400.0, 600.0));
        side.insert(Element::shape(
            ShapeKind::Circle,
            Point::new(150.0, 250.0),
            100.0,
            100.0,
        ));
        side
    }

    #[test]
    fn test_profile_dimensions_and_scales() {
        assert_eq!(DeviceProfile::Mobile.dimensions(), (375, 667));
        assert_eq!(DeviceProfile::Tablet.dimensions(), (768, 1024));
        assert_eq!(DeviceProfile::Desktop.dimensions(), (1920, 1080));
        assert_eq!(DeviceProfile::Print.dimensions(), (2480, 3508));

        assert!((DeviceProfile::Desktop.scale() - 1.0).abs() < 1e-12);
        assert!((DeviceProfile::Print.scale() - 3.125).abs() < 1e-12);
        assert!((DeviceProfile::Mobile.scale() - 326.0 / 96.0).abs() < 1e-12);
    }

    #[test]
    fn test_png_export_decodes_to_device_dimensions() {
        let bytes = export(
            &sample_side(),
            DeviceProfile::Mobile,
            ExportFormat::Png,
            PreviewMode::Realistic,
        )
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (375, 667));
    }

    #[test]
    fn test_jpeg_export_round_trips() {
        let bytes = export(
            &sample_side(),
            DeviceProfile::Desktop,
            ExportFormat::Jpeg { quality: 85 },
            PreviewMode::Realistic,
        )
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1920, 1080));
    }

    #[test]
    fn test_webp_export_round_trips() {
        let bytes = export(
            &sample_side(),
            DeviceProfile::Tablet,
            ExportFormat::WebP { quality: 80 },
            PreviewMode::Realistic,
        )
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (768, 1024));
    }

    #[test]
    fn test_fit_zoom_uses_limiting_axis() {
        // 400x600 into 375x667: width limits (375/400 < 667/600).
        let zoom = fit_zoom(Size::new(400.0, 600.0), 375, 667);
        assert!((zoom - 375.0 / 400.0).abs() < 1e-12);
    }
}
