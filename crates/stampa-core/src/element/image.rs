//! Image element payload.

use crate::color::{RecolorFilter, Rgba};
use serde::{Deserialize, Serialize};

/// Style properties for an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// Where the bitmap lives (gallery asset or customer upload).
    pub source_url: String,
    /// Inline image bytes, base64-encoded. Takes precedence over the URL
    /// when present so documents stay renderable offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Optional non-destructive recolor target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recolor_fill: Option<Rgba>,
}

impl ImageStyle {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            data_base64: None,
            recolor_fill: None,
        }
    }

    /// Attach inline image bytes.
    pub fn with_data(mut self, data: &[u8]) -> Self {
        use base64::{engine::general_purpose::STANDARD, Engine};
        self.data_base64 = Some(STANDARD.encode(data));
        self
    }

    /// Decode the inline image bytes, if any.
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        self.data_base64
            .as_deref()
            .and_then(|b64| STANDARD.decode(b64).ok())
    }

    /// The recolor filter for this image, or `None` when no recolor target is
    /// set or the target cannot be reached by hue rotation.
    pub fn recolor_filter(&self) -> Option<RecolorFilter> {
        self.recolor_fill.and_then(RecolorFilter::for_target)
    }
}

/// Scale `(source_width, source_height)` to fit within a box while
/// preserving aspect ratio.
///
/// Degenerate inputs (zero, negative or non-finite dimensions) collapse to
/// `(0, 0)` instead of propagating NaN into a transform.
pub fn fit_within(
    source_width: f64,
    source_height: f64,
    max_width: f64,
    max_height: f64,
) -> (f64, f64) {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(source_width) || !valid(source_height) || !valid(max_width) || !valid(max_height) {
        return (0.0, 0.0);
    }
    let aspect = source_width / source_height;
    let target_aspect = max_width / max_height;

    if aspect > target_aspect {
        (max_width, max_width / aspect)
    } else {
        (max_height * aspect, max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within() {
        // 2:1 image into a square box fits to width.
        let (w, h) = fit_within(1000.0, 500.0, 400.0, 400.0);
        assert!((w - 400.0).abs() < 0.01);
        assert!((h - 200.0).abs() < 0.01);

        // 1:2 image into a square box fits to height.
        let (w, h) = fit_within(500.0, 1000.0, 400.0, 400.0);
        assert!((w - 200.0).abs() < 0.01);
        assert!((h - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_within_degenerate_inputs() {
        assert_eq!(fit_within(1000.0, 0.0, 400.0, 400.0), (0.0, 0.0));
        assert_eq!(fit_within(1000.0, 500.0, 400.0, -1.0), (0.0, 0.0));
        assert_eq!(fit_within(f64::NAN, 500.0, 400.0, 400.0), (0.0, 0.0));

        // No NaN ever reaches an element transform.
        let (w, h) = fit_within(0.0, 0.0, 400.0, 400.0);
        assert!(w.is_finite() && h.is_finite());
    }

    #[test]
    fn test_inline_data_round_trip() {
        let style = ImageStyle::new("assets/logo.png").with_data(&[1, 2, 3, 250]);
        assert_eq!(style.data(), Some(vec![1, 2, 3, 250]));
    }

    #[test]
    fn test_recolor_filter_gating() {
        let mut style = ImageStyle::new("x.png");
        assert!(style.recolor_filter().is_none());

        style.recolor_fill = Some(Rgba::black());
        assert!(style.recolor_filter().is_none());

        style.recolor_fill = Some(Rgba::opaque(0, 255, 0));
        let filter = style.recolor_filter().unwrap();
        assert_eq!(filter.hue_deg, 120.0);
    }
}
