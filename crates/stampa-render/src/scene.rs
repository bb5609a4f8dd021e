//! Scene walk: paints one side of a template into a pixel buffer.
//!
//! Stateless by construction. Every call builds its own target from the
//! context and an immutable side snapshot, so callers can render previews
//! for several devices concurrently from the same template.

use image::RgbaImage;
use kurbo::{Affine, BezPath, Circle, Point, Shape as KurboShape, Size};
use log::warn;
use stampa_core::element::{Element, ElementKind, MaskDescriptor};
use stampa_core::tree::Side;
use stampa_core::Rgba;

use crate::raster::Raster;
use crate::renderer::{Backdrop, PreviewMode, RenderContext};
use crate::text;

/// Drop shadow offset in surface pixels (realistic mode).
const SHADOW_OFFSET: f64 = 2.0;
const SHADOW_COLOR: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 60,
};

/// Render one side into a fresh buffer sized to the context target.
pub fn render_side(side: &Side, ctx: &RenderContext) -> RgbaImage {
    let width = (ctx.target_size.width.round() as u32).max(1);
    let height = (ctx.target_size.height.round() as u32).max(1);
    let mut raster = Raster::new(width, height);

    paint_backdrop(&mut raster, ctx);
    paint_side_background(&mut raster, side, ctx);

    for (index, element) in side.tree.ordered().into_iter().enumerate() {
        if !element.visible {
            continue;
        }
        if ctx.mode == PreviewMode::Print && !element.caps.printable {
            continue;
        }
        let animation_offset = if ctx.mode == PreviewMode::Animation {
            ctx.timeline.offset_for(index)
        } else {
            0.0
        };
        paint_element(&mut raster, element, ctx, animation_offset);
    }

    match ctx.mode {
        PreviewMode::Print => paint_registration_marks(&mut raster),
        PreviewMode::Mockup => paint_mockup_shadow(&mut raster),
        _ => {}
    }

    raster.into_image()
}

fn paint_backdrop(raster: &mut Raster, ctx: &RenderContext) {
    match ctx.backdrop {
        Backdrop::White => raster.clear(Rgba::white()),
        Backdrop::Transparent => raster.checkerboard(
            (Backdrop::CHECKER_SIZE as f64 * ctx.zoom).round().max(1.0) as u32,
            Rgba::white(),
            Rgba::opaque(0xcc, 0xcc, 0xcc),
        ),
        Backdrop::Dark => raster.clear(Backdrop::dark_color()),
        Backdrop::Gradient => {
            let (top, bottom) = Backdrop::gradient_stops();
            raster.vertical_gradient(top, bottom);
        }
    }
}

fn paint_side_background(raster: &mut Raster, side: &Side, ctx: &RenderContext) {
    let Some(background) = &side.background else {
        return;
    };
    let w = (side.surface.width * ctx.zoom).round() as i64;
    let h = (side.surface.height * ctx.zoom).round() as i64;
    if let Some(color) = background.color {
        raster.fill_rect(0, 0, w, h, color, 1.0);
    }
    if let Some(url) = &background.image_url {
        match fetch_and_decode(ctx, url, None) {
            Some(bitmap) => raster.draw_bitmap(
                &bitmap,
                Affine::scale(ctx.zoom),
                side.surface,
                1.0,
                None,
                None,
            ),
            None => warn!("background image {url:?} could not be loaded"),
        }
    }
}

/// Local-to-target transform for an element: zoom, then placement, then
/// rotation about the element center.
fn element_transform(element: &Element, ctx: &RenderContext, animation_offset: f64) -> Affine {
    let t = &element.transform;
    let center = Point::new(t.width / 2.0, t.height / 2.0);
    Affine::scale(ctx.zoom)
        * Affine::translate((t.x, t.y + animation_offset))
        * Affine::translate(center.to_vec2())
        * Affine::rotate(t.rotation_deg.to_radians())
        * Affine::translate(-center.to_vec2())
}

fn paint_element(raster: &mut Raster, element: &Element, ctx: &RenderContext, offset: f64) {
    let to_target = element_transform(element, ctx, offset);
    let local_size = Size::new(element.transform.width, element.transform.height);
    let mask_path = element
        .mask
        .as_ref()
        .map(|m| m.shape.path(local_size.width, local_size.height, 0.0));
    let clip_target = mask_path.as_ref().map(|p| to_target * p.clone());
    let shadow = ctx.shadows && ctx.mode == PreviewMode::Realistic;
    let shadow_transform =
        Affine::translate((SHADOW_OFFSET * ctx.zoom, SHADOW_OFFSET * ctx.zoom)) * to_target;

    match &element.kind {
        ElementKind::Shape(style) => {
            let path = style
                .shape
                .path(local_size.width, local_size.height, style.corner_radius);
            if shadow {
                raster.fill_path(&path, shadow_transform, SHADOW_COLOR, element.opacity, None);
            }
            if !style.fill.is_transparent() {
                raster.fill_path(
                    &path,
                    to_target,
                    style.fill,
                    element.opacity,
                    clip_target.as_ref(),
                );
            }
            if style.stroke_width > 0.0 && !style.stroke.is_transparent() {
                raster.stroke_path(
                    &path,
                    to_target,
                    style.stroke,
                    style.stroke_width,
                    element.opacity,
                    clip_target.as_ref(),
                );
            }
        }
        ElementKind::Text(style) => {
            let lines = text::wrap_lines(style, local_size.width);
            let mut path = BezPath::new();
            for (i, line) in lines.iter().enumerate() {
                let origin = Point::new(
                    text::align_offset(style, line, local_size.width),
                    i as f64 * style.line_height(),
                );
                path.extend(text::line_path(style, line, origin));
            }
            if shadow {
                raster.fill_path(&path, shadow_transform, SHADOW_COLOR, element.opacity, None);
            }
            raster.fill_path(
                &path,
                to_target,
                style.color,
                element.opacity,
                clip_target.as_ref(),
            );
        }
        ElementKind::Image(style) => {
            let decoded = style
                .data()
                .and_then(|bytes| decode(&bytes, &style.source_url))
                .or_else(|| fetch_and_decode(ctx, &style.source_url, Some(&element.id.to_string())));
            match decoded {
                Some(bitmap) => {
                    if shadow {
                        let silhouette = kurbo::Rect::new(0.0, 0.0, local_size.width, local_size.height)
                            .to_path(0.1);
                        raster.fill_path(
                            &silhouette,
                            shadow_transform,
                            SHADOW_COLOR,
                            element.opacity,
                            None,
                        );
                    }
                    raster.draw_bitmap(
                        &bitmap,
                        to_target,
                        local_size,
                        element.opacity,
                        style.recolor_filter().as_ref(),
                        mask_path.as_ref(),
                    );
                }
                None => paint_placeholder(raster, to_target, local_size, element.opacity),
            }
        }
    }

    if let Some(mask) = &element.mask {
        paint_mask_outline(raster, mask, mask_path.as_ref(), to_target, element.opacity);
    }
}

fn paint_mask_outline(
    raster: &mut Raster,
    mask: &MaskDescriptor,
    path: Option<&BezPath>,
    to_target: Affine,
    opacity: f64,
) {
    let Some(path) = path else { return };
    if mask.stroke_width > 0.0 && !mask.stroke_color.is_transparent() {
        raster.stroke_path(path, to_target, mask.stroke_color, mask.stroke_width, opacity, None);
    }
}

/// Neutral placeholder for unresolvable image sources: a gray panel with a
/// frame and a mountain-and-sun pictogram. Painting it instead of failing
/// keeps one broken asset from taking down the whole preview.
fn paint_placeholder(raster: &mut Raster, to_target: Affine, local_size: Size, opacity: f64) {
    let (w, h) = (local_size.width, local_size.height);
    let panel = kurbo::Rect::new(0.0, 0.0, w, h).to_path(0.1);
    raster.fill_path(&panel, to_target, Rgba::opaque(0xe5, 0xe7, 0xeb), opacity, None);
    raster.stroke_path(&panel, to_target, Rgba::opaque(0x9c, 0xa3, 0xaf), 2.0, opacity, None);

    let accent = Rgba::opaque(0x9c, 0xa3, 0xaf);
    let sun = Circle::new(Point::new(w * 0.3, h * 0.3), w.min(h) * 0.1).to_path(0.1);
    raster.fill_path(&sun, to_target, accent, opacity, None);

    let mut mountain = BezPath::new();
    mountain.move_to(Point::new(w * 0.15, h * 0.8));
    mountain.line_to(Point::new(w * 0.45, h * 0.45));
    mountain.line_to(Point::new(w * 0.65, h * 0.65));
    mountain.line_to(Point::new(w * 0.85, h * 0.5));
    mountain.line_to(Point::new(w * 0.85, h * 0.8));
    mountain.close_path();
    raster.fill_path(&mountain, to_target, accent, opacity, None);
}

/// Cross-and-circle registration marks in all four corners (print mode).
fn paint_registration_marks(raster: &mut Raster) {
    let w = raster.width() as f64;
    let h = raster.height() as f64;
    let inset = (w.min(h) * 0.03).clamp(12.0, 40.0);
    let arm = inset * 0.6;
    let centers = [
        Point::new(inset, inset),
        Point::new(w - inset, inset),
        Point::new(inset, h - inset),
        Point::new(w - inset, h - inset),
    ];
    for center in centers {
        let mut cross = BezPath::new();
        cross.move_to(Point::new(center.x - arm, center.y));
        cross.line_to(Point::new(center.x + arm, center.y));
        cross.move_to(Point::new(center.x, center.y - arm));
        cross.line_to(Point::new(center.x, center.y + arm));
        raster.stroke_path(&cross, Affine::IDENTITY, Rgba::black(), 1.5, 1.0, None);

        let ring = Circle::new(center, arm * 0.55).to_path(0.1);
        raster.stroke_path(&ring, Affine::IDENTITY, Rgba::black(), 1.5, 1.0, None);
    }
}

/// Soft perspective shadow along the bottom-right edge (mockup mode).
fn paint_mockup_shadow(raster: &mut Raster) {
    let w = raster.width() as f64;
    let h = raster.height() as f64;
    let mut shadow = BezPath::new();
    shadow.move_to(Point::new(w * 0.12, h * 0.94));
    shadow.line_to(Point::new(w * 0.96, h * 0.9));
    shadow.line_to(Point::new(w, h));
    shadow.line_to(Point::new(w * 0.06, h));
    shadow.close_path();
    raster.fill_path(&shadow, Affine::IDENTITY, SHADOW_COLOR, 1.0, None);
}

fn decode(bytes: &[u8], source: &str) -> Option<RgbaImage> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => Some(decoded.to_rgba8()),
        Err(e) => {
            warn!("image {source:?} could not be decoded: {e}");
            None
        }
    }
}

fn fetch_and_decode(ctx: &RenderContext, url: &str, element: Option<&str>) -> Option<RgbaImage> {
    let provider = ctx.images?;
    match provider.fetch(url) {
        Some(bytes) => decode(&bytes, url),
        None => {
            if let Some(id) = element {
                warn!("image source {url:?} for element {id} is unavailable");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::AnimationTimeline;
    use stampa_core::element::ShapeKind;
    use stampa_core::{Capabilities, Element};

    fn hello_circle_side() -> Side {
        let mut side = Side::new("front", Size::new(400.0, 600.0));
        side.insert(Element::text("Hello", Point::new(50.0, 50.0)));
        side.insert(Element::shape(
            ShapeKind::Circle,
            Point::new(150.0, 300.0),
            100.0,
            100.0,
        ));
        side
    }

    fn ctx() -> RenderContext<'static> {
        RenderContext::new(Size::new(400.0, 600.0))
    }

    #[test]
    fn test_hello_circle_scene() {
        let image = render_side(&hello_circle_side(), &ctx());
        assert_eq!((image.width(), image.height()), (400, 600));

        // Circle center carries the default shape fill.
        let px = image.get_pixel(200, 350).0;
        assert_eq!((px[0], px[1], px[2]), (0x3b, 0x82, 0xf6));

        // The text box region contains dark glyph pixels.
        let mut dark = 0;
        for y in 50..80 {
            for x in 50..120 {
                if image.get_pixel(x, y).0[0] < 100 {
                    dark += 1;
                }
            }
        }
        assert!(dark > 0, "expected glyph pixels in the text region");

        // Backdrop stays white away from elements.
        assert_eq!(image.get_pixel(390, 10).0, [255, 255, 255, 255]);

        // Rendered circle diameter matches the element box at zoom 1.
        let diameter = (0..400)
            .filter(|&x| {
                let p = image.get_pixel(x, 350).0;
                (p[0], p[1], p[2]) == (0x3b, 0x82, 0xf6)
            })
            .count();
        assert!(
            (diameter as i64 - 100).abs() <= 4,
            "expected ~100px diameter, got {diameter}"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let side = hello_circle_side();
        let a = render_side(&side, &ctx());
        let b = render_side(&side, &ctx());
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_invisible_elements_are_skipped() {
        let mut side = hello_circle_side();
        let circle_id = side.tree.ordered()[1].id;
        side.tree.by_id_mut(circle_id).unwrap().visible = false;

        let image = render_side(&side, &ctx());
        assert_eq!(image.get_pixel(200, 350).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_print_mode_drops_unprintable_and_adds_marks() {
        let mut side = hello_circle_side();
        let circle_id = side.tree.ordered()[1].id;
        side.tree.by_id_mut(circle_id).unwrap().caps = Capabilities {
            printable: false,
            ..Capabilities::default()
        };

        let image = render_side(&side, &ctx().with_mode(PreviewMode::Print));
        // Unprintable circle is gone.
        assert_eq!(image.get_pixel(200, 350).0, [255, 255, 255, 255]);
        // A registration cross runs through each corner center.
        let inset = 12;
        assert!(image.get_pixel(inset, inset).0[0] < 100);
        assert!(image.get_pixel(400 - inset, 600 - inset).0[0] < 100);
    }

    #[test]
    fn test_zoom_scales_geometry() {
        let side = hello_circle_side();
        let ctx = RenderContext::new(Size::new(800.0, 1200.0)).with_zoom(2.0);
        let image = render_side(&side, &ctx);
        // Circle center moves with the zoom factor.
        let px = image.get_pixel(400, 700).0;
        assert_eq!((px[0], px[1], px[2]), (0x3b, 0x82, 0xf6));
    }

    #[test]
    fn test_broken_image_paints_placeholder() {
        let mut side = Side::new("front", Size::new(200.0, 200.0));
        let mut element = Element::image("missing.png", Point::new(50.0, 50.0), 100.0, 100.0, 100.0, 100.0);
        if let ElementKind::Image(style) = &mut element.kind {
            style.data_base64 = Some("bm90IGFuIGltYWdl".to_string()); // "not an image"
        }
        side.insert(element);

        let image = render_side(&side, &ctx());
        // Placeholder panel gray inside the element box.
        let px = image.get_pixel(95, 60).0;
        assert_eq!((px[0], px[1], px[2]), (0xe5, 0xe7, 0xeb));
    }

    #[test]
    fn test_animation_offset_moves_elements() {
        let mut side = Side::new("front", Size::new(200.0, 200.0));
        side.insert(Element::shape(
            ShapeKind::Rectangle,
            Point::new(50.0, 50.0),
            60.0,
            60.0,
        ));
        let still = render_side(&side, &RenderContext::new(Size::new(200.0, 200.0)));
        let animated = render_side(
            &side,
            &RenderContext::new(Size::new(200.0, 200.0))
                .with_mode(PreviewMode::Animation)
                .with_timeline(AnimationTimeline {
                    step: 3,
                    playing: true,
                })
                .with_shadows(false),
        );
        assert_ne!(still.as_raw(), animated.as_raw());
    }

    #[test]
    fn test_dark_backdrop() {
        let side = Side::new("front", Size::new(50.0, 50.0));
        let image = render_side(
            &side,
            &RenderContext::new(Size::new(50.0, 50.0)).with_backdrop(Backdrop::Dark),
        );
        let px = image.get_pixel(25, 25).0;
        assert_eq!((px[0], px[1], px[2]), (0x1f, 0x29, 0x37));
    }

    #[test]
    fn test_transparent_backdrop_checkerboard() {
        let side = Side::new("front", Size::new(100.0, 100.0));
        let image = render_side(
            &side,
            &RenderContext::new(Size::new(100.0, 100.0)).with_backdrop(Backdrop::Transparent),
        );
        assert_ne!(image.get_pixel(5, 5).0, image.get_pixel(25, 5).0);
    }

    #[test]
    fn test_mask_clips_image() {
        use stampa_core::element::MaskDescriptor;

        // A 1x1 solid red source stretched over the element box.
        let mut png = Vec::new();
        {
            use image::codecs::png::PngEncoder;
            use image::ImageEncoder;
            let mut src = RgbaImage::new(1, 1);
            src.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
            PngEncoder::new(&mut png)
                .write_image(src.as_raw(), 1, 1, image::ExtendedColorType::Rgba8)
                .unwrap();
        }

        let mut side = Side::new("front", Size::new(200.0, 200.0));
        let mut element = Element::image("red.png", Point::new(50.0, 50.0), 100.0, 100.0, 100.0, 100.0);
        if let ElementKind::Image(style) = &mut element.kind {
            *style = style.clone().with_data(&png);
        }
        element.mask = Some(MaskDescriptor {
            shape: ShapeKind::Circle,
            stroke_color: Rgba::black(),
            stroke_width: 0.0,
        });
        side.insert(element);

        let image = render_side(&side, &ctx().with_shadows(false));
        // Center of the circle mask is red; the box corner is clipped away.
        assert_eq!(image.get_pixel(100, 100).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(54, 54).0, [255, 255, 255, 255]);
    }
}
