//! Element model: one placed item on a side, its transform and its
//! capability flags.

mod image;
mod patch;
mod shape;
mod text;

pub use image::{fit_within, ImageStyle};
pub use patch::ElementPatch;
pub use shape::{heart_path, star_path, ShapeKind, ShapeStyle, STAR_POINTS};
pub use text::{FontWeight, TextAlign, TextStyle};

use crate::color::Rgba;
use crate::coords::{absolute_to_relative, relative_to_absolute, RelativePoint};
use crate::error::{DesignError, DesignResult};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
///
/// Ids are unique within a side; with cross-side sync the same logical id
/// deliberately appears on several sides.
pub type ElementId = Uuid;

/// Who is performing a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Template authoring context; capability checks are bypassed.
    Admin,
    /// End customer editing a constrained template copy.
    Customer,
}

/// The mutation classes gated by capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Move,
    Resize,
    Rotate,
    Delete,
    ReplaceImage,
    AddMask,
    EditMask,
    EditMaskStrokeWidth,
    EditMaskStrokeColor,
    EditMaskedImage,
}

impl std::fmt::Display for EditOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EditOp::Move => "moving",
            EditOp::Resize => "resizing",
            EditOp::Rotate => "rotating",
            EditOp::Delete => "deletion",
            EditOp::ReplaceImage => "replacing the image",
            EditOp::AddMask => "adding a mask",
            EditOp::EditMask => "editing the mask",
            EditOp::EditMaskStrokeWidth => "editing the mask stroke width",
            EditOp::EditMaskStrokeColor => "editing the mask stroke color",
            EditOp::EditMaskedImage => "editing the masked image",
        };
        f.write_str(name)
    }
}

/// Per-element permissions controlling what an end customer may alter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub can_move: bool,
    pub can_resize: bool,
    pub can_rotate: bool,
    pub can_delete: bool,
    pub can_replace_image: bool,
    /// The customer must touch this element before checkout.
    pub mandatory_to_edit: bool,
    /// Included in print/export output.
    pub printable: bool,
    // Mask permissions are independent of the flags above.
    pub can_add_mask: bool,
    pub can_edit_mask: bool,
    pub can_edit_mask_stroke_width: bool,
    pub can_edit_mask_stroke_color: bool,
    pub can_edit_masked_image: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_move: true,
            can_resize: true,
            can_rotate: true,
            can_delete: true,
            can_replace_image: true,
            mandatory_to_edit: false,
            printable: true,
            can_add_mask: false,
            can_edit_mask: true,
            can_edit_mask_stroke_width: true,
            can_edit_mask_stroke_color: true,
            can_edit_masked_image: true,
        }
    }
}

impl Capabilities {
    /// Everything locked down; useful for fixed branding elements.
    pub fn locked() -> Self {
        Self {
            can_move: false,
            can_resize: false,
            can_rotate: false,
            can_delete: false,
            can_replace_image: false,
            mandatory_to_edit: false,
            printable: true,
            can_add_mask: false,
            can_edit_mask: false,
            can_edit_mask_stroke_width: false,
            can_edit_mask_stroke_color: false,
            can_edit_masked_image: false,
        }
    }

    pub fn allows(&self, op: EditOp) -> bool {
        match op {
            EditOp::Move => self.can_move,
            EditOp::Resize => self.can_resize,
            EditOp::Rotate => self.can_rotate,
            EditOp::Delete => self.can_delete,
            EditOp::ReplaceImage => self.can_replace_image,
            EditOp::AddMask => self.can_add_mask,
            EditOp::EditMask => self.can_edit_mask,
            EditOp::EditMaskStrokeWidth => self.can_edit_mask_stroke_width,
            EditOp::EditMaskStrokeColor => self.can_edit_mask_stroke_color,
            EditOp::EditMaskedImage => self.can_edit_masked_image,
        }
    }
}

/// A shape reference clipping an element, with its own stroke parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskDescriptor {
    pub shape: ShapeKind,
    pub stroke_color: Rgba,
    pub stroke_width: f64,
}

/// Placement of an element on its side's reference surface.
///
/// Absolute pixels are authoritative; the relative mirror is recomputed
/// after every mutation and surface resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub relative: RelativePoint,
    pub width: f64,
    pub height: f64,
    /// Degrees in [0, 360), rotation about the element center.
    pub rotation_deg: f64,
    pub z_index: u32,
}

impl Transform {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            relative: RelativePoint::default(),
            width,
            height,
            rotation_deg: 0.0,
            z_index: 0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Recompute the relative mirror from the absolute position.
    pub fn sync_relative(&mut self, surface: Size) {
        self.relative = absolute_to_relative(self.position(), surface.width, surface.height);
    }

    /// Recompute the absolute position from the relative mirror.
    pub fn sync_absolute(&mut self, surface: Size) {
        let point = relative_to_absolute(self.relative, surface.width, surface.height);
        self.x = point.x;
        self.y = point.y;
    }
}

/// Kind-specific payload of an element. Exhaustive matches keep render and
/// property dispatch compiler-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextStyle),
    Shape(ShapeStyle),
    Image(ImageStyle),
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Shape(_) => "shape",
            ElementKind::Image(_) => "image",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ElementKind::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ElementKind::Image(_))
    }
}

/// One placed item (text, shape or image) on a side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub transform: Transform,
    /// Overall opacity in [0, 1].
    pub opacity: f64,
    pub caps: Capabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskDescriptor>,
    pub visible: bool,
    /// Blocks every customer mutation regardless of individual flags.
    pub locked: bool,
}

impl Element {
    fn base(kind: ElementKind, transform: Transform) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            transform,
            opacity: 1.0,
            caps: Capabilities::default(),
            mask: None,
            visible: true,
            locked: false,
        }
    }

    /// New text element with stock defaults (24px Arial, black, left).
    /// The box is sized to the measured single-line content.
    pub fn text(content: impl Into<String>, position: Point) -> Self {
        let style = TextStyle::new(content);
        let width = style.measure(&style.content).max(40.0);
        let height = style.line_height();
        Self::base(
            ElementKind::Text(style),
            Transform::new(position.x, position.y, width, height),
        )
    }

    /// New shape element with the stock shape palette defaults.
    pub fn shape(kind: ShapeKind, position: Point, width: f64, height: f64) -> Self {
        Self::base(
            ElementKind::Shape(ShapeStyle::new(kind)),
            Transform::new(position.x, position.y, width, height),
        )
    }

    /// New image element scaled to fit the given box.
    pub fn image(
        source_url: impl Into<String>,
        position: Point,
        source_width: f64,
        source_height: f64,
        max_width: f64,
        max_height: f64,
    ) -> Self {
        let (width, height) = fit_within(source_width, source_height, max_width, max_height);
        Self::base(
            ElementKind::Image(ImageStyle::new(source_url)),
            Transform::new(position.x, position.y, width, height),
        )
    }

    /// Set the capability flags (builder style).
    pub fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Check whether `actor` may perform `op` on this element.
    ///
    /// Admin contexts bypass capability flags entirely.
    pub fn enforce_capability(&self, op: EditOp, actor: Actor) -> DesignResult<()> {
        if actor == Actor::Admin {
            return Ok(());
        }
        if !self.locked && self.caps.allows(op) {
            Ok(())
        } else {
            Err(DesignError::PermissionDenied(op))
        }
    }
}
