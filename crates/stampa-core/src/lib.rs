//! Stampa Core Library
//!
//! Platform-agnostic data structures and mutation logic for the Stampa
//! personalization engine: coordinate math, the element/permission model,
//! per-side design trees and the template aggregate.

pub mod catalog;
pub mod color;
pub mod coords;
pub mod doc;
pub mod element;
pub mod error;
pub mod storage;
pub mod template;
pub mod tree;

pub use color::{hue_rotation_for, RecolorFilter, Rgba};
pub use coords::{absolute_to_relative, relative_to_absolute, RelativePoint};
pub use element::{
    Actor, Capabilities, EditOp, Element, ElementId, ElementKind, ElementPatch, MaskDescriptor,
    ShapeKind, TextAlign, Transform,
};
pub use error::{DesignError, DesignResult};
pub use template::{Metadata, Quotas, Template, TemplateSettings, UploadFormat};
pub use tree::{Background, DesignTree, Side};
