//! Text element payload and measurement.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a text block inside its element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// Style properties for a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub color: Rgba,
    pub align: TextAlign,
}

impl TextStyle {
    /// Default font size for new text elements.
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: "Arial".to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: FontWeight::default(),
            color: Rgba::black(),
            align: TextAlign::default(),
        }
    }

    /// Line height used for layout and bounds.
    pub fn line_height(&self) -> f64 {
        self.font_size * 1.2
    }

    /// Average glyph width as a fraction of the font size.
    ///
    /// Empirically determined approximations per family class and weight;
    /// actual widths depend on the font the target surface resolves.
    pub fn char_width_factor(&self) -> f64 {
        let family = self.font_family.to_ascii_lowercase();
        let serif = family.contains("times") || family.contains("georgia") || family.contains("serif");
        let mono = family.contains("courier") || family.contains("mono");

        if mono {
            return 0.60;
        }
        match (serif, self.font_weight) {
            (true, FontWeight::Light) => 0.55,
            (true, FontWeight::Regular) => 0.58,
            (true, FontWeight::Bold) => 0.60,
            (false, FontWeight::Light) => 0.50,
            (false, FontWeight::Regular) => 0.52,
            (false, FontWeight::Bold) => 0.55,
        }
    }

    /// Measured width of a run of text in pixels.
    pub fn measure(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_size * self.char_width_factor()
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = TextStyle::new("Hello");
        assert_eq!(style.font_family, "Arial");
        assert!((style.font_size - 24.0).abs() < f64::EPSILON);
        assert_eq!(style.color, Rgba::black());
        assert_eq!(style.align, TextAlign::Left);
    }

    #[test]
    fn test_line_height() {
        let style = TextStyle::new("x");
        assert!((style.line_height() - 28.8).abs() < 1e-9);
    }

    #[test]
    fn test_measure_scales_with_length() {
        let style = TextStyle::new("");
        assert!(style.measure("Hello World") > style.measure("Hello"));
        assert_eq!(style.measure(""), 0.0);
    }

    #[test]
    fn test_weight_widens() {
        let regular = TextStyle::new("");
        let mut bold = TextStyle::new("");
        bold.font_weight = FontWeight::Bold;
        assert!(bold.measure("abc") > regular.measure("abc"));
    }
}
