//! Color primitives shared by the element model and the renderer.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::opaque(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::opaque(255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Pure opaque black. Hue rotation cannot recolor it.
    pub fn is_pure_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.a == 255
    }

    /// Perceptually-light test used when deriving recolor filters:
    /// the packed RGB value is compared against mid-gray.
    pub fn is_light(&self) -> bool {
        let packed = ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32;
        packed > 0x888888
    }

    /// Apply an opacity factor to the alpha channel.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
        Self::new(self.r, self.g, self.b, alpha)
    }

    /// Parse a CSS-style color string: `transparent`, `#rgb`, `#rrggbb`
    /// or `#rrggbbaa`.
    pub fn parse(color: &str) -> Option<Self> {
        if color.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }

        let hex = color.strip_prefix('#')?.trim();
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::opaque(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::opaque(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Format as a CSS-style color string. `parse(to_css())` round-trips.
    pub fn to_css(&self) -> String {
        if self.is_transparent() {
            "transparent".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Convert sRGB components (0..=1) to HSL. Hue is in degrees [0, 360).
pub fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0 * 360.0, s, l)
}

/// Convert HSL (hue in degrees) back to sRGB components (0..=1).
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s <= 0.0 {
        return (l, l, l);
    }

    fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hn = h.rem_euclid(360.0) / 360.0;

    (
        hue_to_channel(p, q, hn + 1.0 / 3.0),
        hue_to_channel(p, q, hn),
        hue_to_channel(p, q, hn - 1.0 / 3.0),
    )
}

/// Hue angle (degrees in [0, 360)) that a hue-rotate filter must apply to
/// reach `color` from a neutral source.
///
/// Transparent and pure black yield 0: hue rotation cannot meaningfully
/// recolor them, so callers must skip the filter entirely (see
/// [`RecolorFilter::for_target`]).
pub fn hue_rotation_for(color: Rgba) -> f64 {
    if color.is_transparent() || color.is_pure_black() {
        return 0.0;
    }
    let (h, _, _) = rgb_to_hsl(
        color.r as f64 / 255.0,
        color.g as f64 / 255.0,
        color.b as f64 / 255.0,
    );
    h.round().rem_euclid(360.0)
}

/// Non-destructive recolor filter derived from a target fill color.
///
/// Light targets get a softer treatment than dark ones so the result stays
/// legible on both ends of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecolorFilter {
    /// Hue rotation in degrees.
    pub hue_deg: f64,
    /// Brightness multiplier.
    pub brightness: f64,
    /// Contrast multiplier around mid-gray.
    pub contrast: f64,
    /// Saturation multiplier.
    pub saturate: f64,
}

impl RecolorFilter {
    /// Derive the filter for a target color, or `None` when the target is
    /// transparent or pure black (no filter is applied in that case).
    pub fn for_target(color: Rgba) -> Option<Self> {
        if color.is_transparent() || color.is_pure_black() {
            return None;
        }
        let hue_deg = hue_rotation_for(color);
        if color.is_light() {
            Some(Self {
                hue_deg,
                brightness: 1.1,
                contrast: 0.9,
                saturate: 1.0,
            })
        } else {
            Some(Self {
                hue_deg,
                brightness: 0.9,
                contrast: 1.1,
                saturate: 1.2,
            })
        }
    }

    /// Apply the filter to one RGB pixel. Alpha is untouched by recoloring.
    pub fn apply(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let (h, s, l) = rgb_to_hsl(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
        let (mut r, mut g, mut b) =
            hsl_to_rgb(h + self.hue_deg, (s * self.saturate).min(1.0), l);

        for c in [&mut r, &mut g, &mut b] {
            *c *= self.brightness;
            *c = (*c - 0.5) * self.contrast + 0.5;
            *c = c.clamp(0.0, 1.0);
        }

        (
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }
}
