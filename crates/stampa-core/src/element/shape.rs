//! Shape element payload and path geometry.

use crate::color::Rgba;
use kurbo::{BezPath, Circle, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Number of spikes on a star shape.
pub const STAR_POINTS: usize = 5;

/// The geometric family of a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Star,
    Heart,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
            ShapeKind::Heart => "heart",
        }
    }

    /// Build the outline path in element-local coordinates (origin at the
    /// element's top-left corner, spanning `width`×`height`).
    pub fn path(&self, width: f64, height: f64, corner_radius: f64) -> BezPath {
        let size = width.min(height);
        match self {
            ShapeKind::Rectangle => {
                let rect = Rect::new(0.0, 0.0, width, height);
                if corner_radius > 0.0 {
                    RoundedRect::from_rect(rect, corner_radius).to_path(0.1)
                } else {
                    rect.to_path(0.1)
                }
            }
            ShapeKind::Circle => {
                Circle::new(Point::new(width / 2.0, height / 2.0), size / 2.0).to_path(0.1)
            }
            ShapeKind::Triangle => {
                let mut path = BezPath::new();
                path.move_to(Point::new(width / 2.0, 0.0));
                path.line_to(Point::new(0.0, height));
                path.line_to(Point::new(width, height));
                path.close_path();
                path
            }
            ShapeKind::Star => star_path(
                Point::new(width / 2.0, height / 2.0),
                size / 4.0,
                size / 2.0,
                STAR_POINTS,
            ),
            ShapeKind::Heart => heart_path(Point::new(width / 2.0, height / 2.0), size / 2.0),
        }
    }
}

/// Star outline: alternating inner/outer radii over `2 * points` polar
/// vertices, starting on the positive x axis.
pub fn star_path(center: Point, inner_radius: f64, outer_radius: f64, points: usize) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..points * 2 {
        let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
        let angle = i as f64 * std::f64::consts::PI / points as f64;
        let vertex = Point::new(
            center.x + angle.cos() * radius,
            center.y + angle.sin() * radius,
        );
        if i == 0 {
            path.move_to(vertex);
        } else {
            path.line_to(vertex);
        }
    }
    path.close_path();
    path
}

/// Heart outline approximated by four fixed cubic Bézier segments.
pub fn heart_path(center: Point, size: f64) -> BezPath {
    let (cx, cy) = (center.x, center.y);
    let mut path = BezPath::new();
    path.move_to(Point::new(cx, cy + size / 4.0));
    path.curve_to(
        Point::new(cx, cy),
        Point::new(cx - size / 2.0, cy),
        Point::new(cx - size / 2.0, cy + size / 4.0),
    );
    path.curve_to(
        Point::new(cx - size / 2.0, cy + size / 2.0),
        Point::new(cx, cy + size),
        Point::new(cx, cy + size),
    );
    path.curve_to(
        Point::new(cx, cy + size),
        Point::new(cx + size / 2.0, cy + size / 2.0),
        Point::new(cx + size / 2.0, cy + size / 4.0),
    );
    path.curve_to(
        Point::new(cx + size / 2.0, cy),
        Point::new(cx, cy),
        Point::new(cx, cy + size / 4.0),
    );
    path.close_path();
    path
}

/// Style properties for a shape element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub shape: ShapeKind,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f64,
    /// Corner radius; only rectangles honor it.
    #[serde(default)]
    pub corner_radius: f64,
}

impl ShapeStyle {
    /// Defaults matching the stock shape palette: blue fill, darker blue
    /// stroke, 2px stroke width.
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            fill: Rgba::opaque(0x3b, 0x82, 0xf6),
            stroke: Rgba::opaque(0x1e, 0x40, 0xaf),
            stroke_width: 2.0,
            corner_radius: 0.0,
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self::new(ShapeKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_vertex_count() {
        let path = star_path(Point::new(50.0, 50.0), 25.0, 50.0, 5);
        // One MoveTo, nine LineTos, one ClosePath.
        assert_eq!(path.elements().len(), 11);
    }

    #[test]
    fn test_star_outer_vertices_on_radius() {
        let center = Point::new(0.0, 0.0);
        let path = star_path(center, 10.0, 30.0, 5);
        let bbox = path.bounding_box();
        assert!((bbox.x1 - 30.0).abs() < 1e-9); // first vertex at angle 0
    }

    #[test]
    fn test_circle_path_diameter() {
        let path = ShapeKind::Circle.path(100.0, 100.0, 0.0);
        let bbox = path.bounding_box();
        assert!((bbox.width() - 100.0).abs() < 0.5);
        assert!((bbox.height() - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_heart_is_closed_and_bounded() {
        let path = heart_path(Point::new(50.0, 50.0), 50.0);
        let bbox = path.bounding_box();
        assert!(bbox.width() > 0.0 && bbox.height() > 0.0);
        assert!(bbox.x0 >= 24.0 && bbox.x1 <= 76.0);
    }

    #[test]
    fn test_default_style() {
        let style = ShapeStyle::new(ShapeKind::Circle);
        assert_eq!(style.fill, Rgba::opaque(0x3b, 0x82, 0xf6));
        assert_eq!(style.stroke_width, 2.0);
    }
}
