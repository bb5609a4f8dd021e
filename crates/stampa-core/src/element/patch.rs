//! Validated element mutations.
//!
//! All coercion and range checking happens here, before a patch reaches a
//! design tree. The tree and the renderer only ever see validated values.

use super::{EditOp, Element, ElementKind, MaskDescriptor, ShapeKind};
use crate::color::Rgba;
use crate::coords::RelativePoint;
use crate::element::text::{FontWeight, TextAlign};
use crate::error::{DesignError, DesignResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// A partial update to one element. Every field is optional; absent fields
/// leave the element untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    // Placement.
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Relative position; used when mirroring a move onto another side.
    /// Ignored when `x`/`y` are present.
    pub relative: Option<RelativePoint>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation_deg: Option<f64>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,

    // Text.
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub text_color: Option<Rgba>,
    pub align: Option<TextAlign>,

    // Shape.
    pub shape: Option<ShapeKind>,
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: Option<f64>,
    pub corner_radius: Option<f64>,

    // Image.
    pub source_url: Option<String>,
    pub recolor_fill: Option<Rgba>,

    // Mask.
    pub mask: Option<MaskDescriptor>,
    pub mask_stroke_width: Option<f64>,
    pub mask_stroke_color: Option<Rgba>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation_deg = Some(degrees);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Check every present field for range and kind errors.
    pub fn validate(&self, element: &Element) -> DesignResult<()> {
        if let Some(w) = self.width {
            if !w.is_finite() || w <= 0.0 {
                return Err(DesignError::validation(format!("width must be positive, got {w}")));
            }
        }
        if let Some(h) = self.height {
            if !h.is_finite() || h <= 0.0 {
                return Err(DesignError::validation(format!("height must be positive, got {h}")));
            }
        }
        if let Some(o) = self.opacity {
            if !(0.0..=1.0).contains(&o) {
                return Err(DesignError::validation(format!(
                    "opacity must be within [0, 1], got {o}"
                )));
            }
        }
        if let Some(r) = self.rotation_deg {
            if !r.is_finite() {
                return Err(DesignError::validation("rotation must be finite"));
            }
        }
        for (value, name) in [(self.x, "x"), (self.y, "y")] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DesignError::validation(format!("{name} must be finite")));
                }
            }
        }
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(DesignError::validation(format!(
                    "font size must be positive, got {size}"
                )));
            }
        }
        for (value, name) in [
            (self.stroke_width, "stroke width"),
            (self.corner_radius, "corner radius"),
            (self.mask_stroke_width, "mask stroke width"),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(DesignError::validation(format!(
                        "{name} must be non-negative, got {v}"
                    )));
                }
            }
        }

        let text_fields = self.content.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.text_color.is_some()
            || self.align.is_some();
        if text_fields && !matches!(element.kind, ElementKind::Text(_)) {
            return Err(DesignError::validation(format!(
                "text properties do not apply to a {} element",
                element.kind.name()
            )));
        }

        let shape_fields = self.shape.is_some()
            || self.fill.is_some()
            || self.stroke.is_some()
            || self.stroke_width.is_some()
            || self.corner_radius.is_some();
        if shape_fields && !matches!(element.kind, ElementKind::Shape(_)) {
            return Err(DesignError::validation(format!(
                "shape properties do not apply to a {} element",
                element.kind.name()
            )));
        }

        let image_fields = self.source_url.is_some() || self.recolor_fill.is_some();
        if image_fields && !matches!(element.kind, ElementKind::Image(_)) {
            return Err(DesignError::validation(format!(
                "image properties do not apply to a {} element",
                element.kind.name()
            )));
        }

        let mask_edit = self.mask_stroke_width.is_some() || self.mask_stroke_color.is_some();
        if mask_edit && element.mask.is_none() && self.mask.is_none() {
            return Err(DesignError::validation("element has no mask to edit"));
        }

        Ok(())
    }

    /// The capability-gated operations this patch implies on `element`.
    pub fn ops(&self, element: &Element) -> Vec<EditOp> {
        let mut ops = Vec::new();
        if self.x.is_some() || self.y.is_some() || self.relative.is_some() {
            ops.push(EditOp::Move);
        }
        if self.width.is_some() || self.height.is_some() {
            ops.push(EditOp::Resize);
        }
        if self.rotation_deg.is_some() {
            ops.push(EditOp::Rotate);
        }
        if self.source_url.is_some() {
            ops.push(EditOp::ReplaceImage);
        }
        if self.mask.is_some() {
            ops.push(if element.mask.is_none() {
                EditOp::AddMask
            } else {
                EditOp::EditMask
            });
        }
        if self.mask_stroke_width.is_some() {
            ops.push(EditOp::EditMaskStrokeWidth);
        }
        if self.mask_stroke_color.is_some() {
            ops.push(EditOp::EditMaskStrokeColor);
        }
        ops
    }

    /// Merge the patch into `element` and recompute the coordinate mirror
    /// against `surface`. The patch must have passed [`validate`] first.
    ///
    /// [`validate`]: ElementPatch::validate
    pub fn apply_to(&self, element: &mut Element, surface: Size) {
        if let Some(x) = self.x {
            element.transform.x = x;
        }
        if let Some(y) = self.y {
            element.transform.y = y;
        }
        if self.x.is_some() || self.y.is_some() {
            element.transform.sync_relative(surface);
        } else if let Some(rel) = self.relative {
            element.transform.relative = rel;
            element.transform.sync_absolute(surface);
        }
        if let Some(w) = self.width {
            element.transform.width = w;
        }
        if let Some(h) = self.height {
            element.transform.height = h;
        }
        if let Some(r) = self.rotation_deg {
            element.transform.rotation_deg = r.rem_euclid(360.0);
        }
        if let Some(o) = self.opacity {
            element.opacity = o;
        }
        if let Some(v) = self.visible {
            element.visible = v;
        }

        match &mut element.kind {
            ElementKind::Text(style) => {
                if let Some(content) = &self.content {
                    style.content = content.clone();
                }
                if let Some(family) = &self.font_family {
                    style.font_family = family.clone();
                }
                if let Some(size) = self.font_size {
                    style.font_size = size;
                }
                if let Some(weight) = self.font_weight {
                    style.font_weight = weight;
                }
                if let Some(color) = self.text_color {
                    style.color = color;
                }
                if let Some(align) = self.align {
                    style.align = align;
                }
            }
            ElementKind::Shape(style) => {
                if let Some(shape) = self.shape {
                    style.shape = shape;
                }
                if let Some(fill) = self.fill {
                    style.fill = fill;
                }
                if let Some(stroke) = self.stroke {
                    style.stroke = stroke;
                }
                if let Some(width) = self.stroke_width {
                    style.stroke_width = width;
                }
                if let Some(radius) = self.corner_radius {
                    style.corner_radius = radius;
                }
            }
            ElementKind::Image(style) => {
                if let Some(url) = &self.source_url {
                    style.source_url = url.clone();
                    style.data_base64 = None;
                }
                if let Some(target) = self.recolor_fill {
                    style.recolor_fill = Some(target);
                }
            }
        }

        if let Some(mask) = &self.mask {
            element.mask = Some(mask.clone());
        }
        if let Some(mask) = &mut element.mask {
            if let Some(width) = self.mask_stroke_width {
                mask.stroke_width = width;
            }
            if let Some(color) = self.mask_stroke_color {
                mask.stroke_color = color;
            }
        }
    }
}
