//! Minimal CPU rasterizer over an RGBA pixel buffer.
//!
//! Paths are flattened with kurbo and filled by a non-zero-winding scanline
//! pass; strokes are expanded to fill outlines with `kurbo::stroke`. Good
//! enough for previews and print exports, with no GPU in sight.

use image::{Rgba as Px, RgbaImage};
use kurbo::{Affine, BezPath, PathEl, Point, Shape, Size, Stroke, StrokeOpts};
use stampa_core::{RecolorFilter, Rgba};

/// Flattening tolerance in target pixels.
const TOLERANCE: f64 = 0.25;

/// A render target: an owned RGBA buffer plus drawing primitives.
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    /// Create a transparent target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Source-over blend of `color` into one pixel, scaled by `opacity`.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba, opacity: f64) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let alpha = (color.a as f64 / 255.0 * opacity.clamp(0.0, 1.0)).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        let inv = 1.0 - alpha;
        let blend_channel = |src: u8, dst: u8| -> u8 {
            (src as f64 * alpha + dst as f64 * inv).round().clamp(0.0, 255.0) as u8
        };
        let out_a = alpha + px.0[3] as f64 / 255.0 * inv;
        px.0 = [
            blend_channel(color.r, px.0[0]),
            blend_channel(color.g, px.0[1]),
            blend_channel(color.b, px.0[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ];
    }

    /// Flood the whole target with an opaque color.
    pub fn clear(&mut self, color: Rgba) {
        let px = Px([color.r, color.g, color.b, color.a]);
        for pixel in self.image.pixels_mut() {
            *pixel = px;
        }
    }

    /// Axis-aligned rectangle fill in pixel coordinates.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba, opacity: f64) {
        for y in y0.max(0)..y1.min(self.height() as i64) {
            for x in x0.max(0)..x1.min(self.width() as i64) {
                self.blend(x, y, color, opacity);
            }
        }
    }

    /// Checkerboard pattern over the whole target.
    pub fn checkerboard(&mut self, cell: u32, light: Rgba, dark: Rgba) {
        let cell = cell.max(1);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { light } else { dark };
                *self.image.get_pixel_mut(x, y) = Px([color.r, color.g, color.b, color.a]);
            }
        }
    }

    /// Vertical linear gradient over the whole target.
    pub fn vertical_gradient(&mut self, top: Rgba, bottom: Rgba) {
        let rows = self.height().max(2) - 1;
        for y in 0..self.height() {
            let t = y as f64 / rows as f64;
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            let color = Px([
                lerp(top.r, bottom.r),
                lerp(top.g, bottom.g),
                lerp(top.b, bottom.b),
                255,
            ]);
            for x in 0..self.width() {
                *self.image.get_pixel_mut(x, y) = color;
            }
        }
    }

    /// Fill a path (non-zero winding) under a transform into target space.
    ///
    /// `clip`, when present, is already in target space; pixels outside it
    /// are skipped.
    pub fn fill_path(
        &mut self,
        path: &BezPath,
        transform: Affine,
        color: Rgba,
        opacity: f64,
        clip: Option<&BezPath>,
    ) {
        let path = transform * path.clone();
        let edges = flatten_to_edges(&path);
        if edges.is_empty() {
            return;
        }

        let bbox = path.bounding_box();
        let y0 = (bbox.y0.floor() as i64).max(0);
        let y1 = (bbox.y1.ceil() as i64).min(self.height() as i64);

        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for y in y0..y1 {
            let sample = y as f64 + 0.5;
            crossings.clear();
            for &(p0, p1) in &edges {
                let (lo, hi) = if p0.y <= p1.y { (p0, p1) } else { (p1, p0) };
                if sample < lo.y || sample >= hi.y {
                    continue;
                }
                let x = lo.x + (sample - lo.y) * (hi.x - lo.x) / (hi.y - lo.y);
                let dir = if p1.y > p0.y { 1 } else { -1 };
                crossings.push((x, dir));
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for &(x, dir) in crossings.iter() {
                let was_inside = winding != 0;
                winding += dir;
                if !was_inside && winding != 0 {
                    span_start = x;
                } else if was_inside && winding == 0 {
                    let px0 = (span_start - 0.5).ceil() as i64;
                    let px1 = (x - 0.5).floor() as i64;
                    for px in px0.max(0)..=px1.min(self.width() as i64 - 1) {
                        if let Some(clip) = clip {
                            if clip.winding(Point::new(px as f64 + 0.5, sample)) == 0 {
                                continue;
                            }
                        }
                        self.blend(px, y, color, opacity);
                    }
                }
            }
        }
    }

    /// Stroke a path outline under a transform into target space.
    pub fn stroke_path(
        &mut self,
        path: &BezPath,
        transform: Affine,
        color: Rgba,
        width: f64,
        opacity: f64,
        clip: Option<&BezPath>,
    ) {
        if width <= 0.0 {
            return;
        }
        let outline = kurbo::stroke(
            path.elements().iter().copied(),
            &Stroke::new(width),
            &StrokeOpts::default(),
            TOLERANCE,
        );
        self.fill_path(&outline, transform, color, opacity, clip);
    }

    /// Draw a decoded bitmap into the element-local unit box `local_size`,
    /// mapped through `to_target`. Sampling is nearest-neighbor through the
    /// inverse transform, so rotation comes for free.
    pub fn draw_bitmap(
        &mut self,
        source: &RgbaImage,
        to_target: Affine,
        local_size: Size,
        opacity: f64,
        filter: Option<&RecolorFilter>,
        clip_local: Option<&BezPath>,
    ) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(local_size.width, 0.0),
            Point::new(0.0, local_size.height),
            Point::new(local_size.width, local_size.height),
        ];
        let mut x0 = f64::INFINITY;
        let mut y0 = f64::INFINITY;
        let mut x1 = f64::NEG_INFINITY;
        let mut y1 = f64::NEG_INFINITY;
        for corner in corners {
            let p = to_target * corner;
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }

        let inverse = to_target.inverse();
        let ys = (y0.floor() as i64).max(0)..(y1.ceil() as i64).min(self.height() as i64);
        for y in ys {
            let xs = (x0.floor() as i64).max(0)..(x1.ceil() as i64).min(self.width() as i64);
            for x in xs {
                let local = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if local.x < 0.0
                    || local.y < 0.0
                    || local.x >= local_size.width
                    || local.y >= local_size.height
                {
                    continue;
                }
                if let Some(clip) = clip_local {
                    if clip.winding(local) == 0 {
                        continue;
                    }
                }
                let sx = (local.x / local_size.width * source.width() as f64) as u32;
                let sy = (local.y / local_size.height * source.height() as f64) as u32;
                let sample = source.get_pixel(
                    sx.min(source.width() - 1),
                    sy.min(source.height() - 1),
                );
                let (r, g, b) = match filter {
                    Some(f) => f.apply(sample.0[0], sample.0[1], sample.0[2]),
                    None => (sample.0[0], sample.0[1], sample.0[2]),
                };
                self.blend(x, y, Rgba::new(r, g, b, sample.0[3]), opacity);
            }
        }
    }
}

/// Flatten a path into closed line-segment edges for scanline filling.
fn flatten_to_edges(path: &BezPath) -> Vec<(Point, Point)> {
    let mut edges = Vec::new();
    let mut start = Point::ZERO;
    let mut current = Point::ZERO;
    kurbo::flatten(path.elements().iter().copied(), TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            // Implicitly close the previous subpath for filling.
            if current != start {
                edges.push((current, start));
            }
            start = p;
            current = p;
        }
        PathEl::LineTo(p) => {
            edges.push((current, p));
            current = p;
        }
        PathEl::ClosePath => {
            if current != start {
                edges.push((current, start));
            }
            current = start;
        }
        // flatten only emits MoveTo/LineTo/ClosePath.
        _ => {}
    });
    if current != start {
        edges.push((current, start));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use stampa_core::element::ShapeKind;

    fn alpha_at(raster: &Raster, x: u32, y: u32) -> u8 {
        raster.image().get_pixel(x, y).0[3]
    }

    #[test]
    fn test_fill_rect_path() {
        let mut raster = Raster::new(40, 40);
        let path = Rect::new(10.0, 10.0, 30.0, 30.0).to_path(0.1);
        raster.fill_path(&path, Affine::IDENTITY, Rgba::opaque(255, 0, 0), 1.0, None);

        assert_eq!(raster.image().get_pixel(20, 20).0, [255, 0, 0, 255]);
        assert_eq!(alpha_at(&raster, 5, 5), 0);
        assert_eq!(alpha_at(&raster, 35, 20), 0);
    }

    #[test]
    fn test_fill_respects_transform() {
        let mut raster = Raster::new(40, 40);
        let path = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1);
        raster.fill_path(
            &path,
            Affine::translate((20.0, 20.0)),
            Rgba::opaque(0, 255, 0),
            1.0,
            None,
        );
        assert_eq!(alpha_at(&raster, 5, 5), 0);
        assert_eq!(raster.image().get_pixel(25, 25).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_star_fills_center() {
        // Non-zero winding must fill the self-intersecting center.
        let mut raster = Raster::new(100, 100);
        let path = ShapeKind::Star.path(100.0, 100.0, 0.0);
        raster.fill_path(&path, Affine::IDENTITY, Rgba::opaque(0, 0, 255), 1.0, None);
        assert_eq!(raster.image().get_pixel(50, 50).0, [0, 0, 255, 255]);
        assert_eq!(alpha_at(&raster, 2, 2), 0);
    }

    #[test]
    fn test_stroke_hits_boundary_not_center() {
        let mut raster = Raster::new(60, 60);
        let path = Rect::new(10.0, 10.0, 50.0, 50.0).to_path(0.1);
        raster.stroke_path(&path, Affine::IDENTITY, Rgba::black(), 4.0, 1.0, None);
        assert!(alpha_at(&raster, 30, 10) > 0);
        assert_eq!(alpha_at(&raster, 30, 30), 0);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut raster = Raster::new(40, 40);
        let path = Rect::new(0.0, 0.0, 40.0, 40.0).to_path(0.1);
        let clip = Rect::new(0.0, 0.0, 20.0, 40.0).to_path(0.1);
        raster.fill_path(&path, Affine::IDENTITY, Rgba::black(), 1.0, Some(&clip));
        assert!(alpha_at(&raster, 10, 20) > 0);
        assert_eq!(alpha_at(&raster, 30, 20), 0);
    }

    #[test]
    fn test_blend_half_opacity_over_white() {
        let mut raster = Raster::new(1, 1);
        raster.clear(Rgba::white());
        raster.blend(0, 0, Rgba::black(), 0.5);
        let px = raster.image().get_pixel(0, 0).0;
        assert!((px[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_checkerboard_alternates() {
        let mut raster = Raster::new(40, 40);
        raster.checkerboard(20, Rgba::white(), Rgba::opaque(200, 200, 200));
        assert_eq!(raster.image().get_pixel(5, 5).0[0], 255);
        assert_eq!(raster.image().get_pixel(25, 5).0[0], 200);
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut raster = Raster::new(4, 10);
        raster.vertical_gradient(Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255));
        assert_eq!(raster.image().get_pixel(0, 0).0[0], 0);
        assert_eq!(raster.image().get_pixel(0, 9).0[0], 255);
    }

    #[test]
    fn test_draw_bitmap_scales() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(0, 0, Px([255, 0, 0, 255]));
        source.put_pixel(1, 0, Px([0, 255, 0, 255]));
        source.put_pixel(0, 1, Px([0, 0, 255, 255]));
        source.put_pixel(1, 1, Px([255, 255, 0, 255]));

        let mut raster = Raster::new(20, 20);
        raster.draw_bitmap(
            &source,
            Affine::IDENTITY,
            Size::new(20.0, 20.0),
            1.0,
            None,
            None,
        );
        assert_eq!(raster.image().get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(raster.image().get_pixel(17, 2).0, [0, 255, 0, 255]);
        assert_eq!(raster.image().get_pixel(2, 17).0, [0, 0, 255, 255]);
    }
}
