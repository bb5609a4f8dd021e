//! Relative⇄absolute coordinate conversion.
//!
//! Positions are stored twice: in absolute pixels against a side's reference
//! surface (authoritative) and as fractions of that surface (the mirror that
//! keeps a design valid across differently-sized render targets).

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A position expressed as fractions of a reference surface, both axes
/// nominally in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

impl RelativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Convert a relative position to absolute pixels on a surface.
pub fn relative_to_absolute(rel: RelativePoint, width: f64, height: f64) -> Point {
    Point::new(rel.x * width, rel.y * height)
}

/// Convert an absolute position to fractions of a surface.
///
/// Degenerate surfaces (zero or negative dimensions) map to the origin
/// instead of dividing by zero.
pub fn absolute_to_relative(point: Point, width: f64, height: f64) -> RelativePoint {
    if width <= 0.0 || height <= 0.0 {
        return RelativePoint::default();
    }
    RelativePoint::new(point.x / width, point.y / height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let surfaces = [(400.0, 600.0), (1.0, 1.0), (2480.0, 3508.0), (37.5, 991.0)];
        let points = [(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (0.125, 0.875), (0.333, 0.667)];

        for &(w, h) in &surfaces {
            for &(x, y) in &points {
                let rel = RelativePoint::new(x, y);
                let back = absolute_to_relative(relative_to_absolute(rel, w, h), w, h);
                assert!((back.x - rel.x).abs() < 1e-6);
                assert!((back.y - rel.y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_degenerate_surface() {
        let rel = absolute_to_relative(Point::new(100.0, 100.0), 0.0, 600.0);
        assert_eq!(rel, RelativePoint::default());
        let rel = absolute_to_relative(Point::new(100.0, 100.0), 400.0, -5.0);
        assert_eq!(rel, RelativePoint::default());
    }

    #[test]
    fn test_known_values() {
        let p = relative_to_absolute(RelativePoint::new(0.25, 0.5), 400.0, 600.0);
        assert_eq!(p, Point::new(100.0, 300.0));
        let rel = absolute_to_relative(Point::new(100.0, 300.0), 400.0, 600.0);
        assert!((rel.x - 0.25).abs() < 1e-12);
        assert!((rel.y - 0.5).abs() < 1e-12);
    }
}
