//! Persisted template documents.
//!
//! The on-disk schema mirrors the in-memory model with one relaxation: the
//! coordinate mirrors are optional on load. A document written by an older
//! client (or an external producer) may carry only absolute or only relative
//! positions; hydration recomputes whichever is missing. Saving always writes
//! both, so `save(load(doc)) == doc` holds for documents this module wrote.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::coords::RelativePoint;
use crate::element::{Capabilities, Element, ElementId, ElementKind, MaskDescriptor, Transform};
use crate::error::{DesignError, DesignResult};
use crate::template::{Metadata, Template, TemplateSettings};
use crate::tree::{Background, Side};

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TemplateDoc {
    schema: u32,
    name: String,
    category: String,
    sides: BTreeMap<String, SideDoc>,
    #[serde(default)]
    settings: TemplateSettings,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct SideDoc {
    width: f64,
    height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background: Option<Background>,
    elements: Vec<ElementDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ElementDoc {
    id: ElementId,
    #[serde(flatten)]
    kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relative: Option<RelativePoint>,
    width: f64,
    height: f64,
    #[serde(default)]
    rotation_deg: f64,
    #[serde(default)]
    z_index: u32,
    #[serde(default = "default_opacity")]
    opacity: f64,
    #[serde(default)]
    caps: Capabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<MaskDescriptor>,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    locked: bool,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

impl ElementDoc {
    fn from_element(element: &Element) -> Self {
        Self {
            id: element.id,
            kind: element.kind.clone(),
            x: Some(element.transform.x),
            y: Some(element.transform.y),
            relative: Some(element.transform.relative),
            width: element.transform.width,
            height: element.transform.height,
            rotation_deg: element.transform.rotation_deg,
            z_index: element.transform.z_index,
            opacity: element.opacity,
            caps: element.caps,
            mask: element.mask.clone(),
            visible: element.visible,
            locked: element.locked,
        }
    }

    /// Rebuild the element, deriving whichever coordinate mirror the document
    /// omitted against the side surface.
    fn hydrate(self, surface: kurbo::Size) -> DesignResult<Element> {
        let mut transform = Transform {
            x: self.x.unwrap_or(0.0),
            y: self.y.unwrap_or(0.0),
            relative: self.relative.unwrap_or_default(),
            width: self.width,
            height: self.height,
            rotation_deg: self.rotation_deg,
            z_index: self.z_index,
        };
        match (self.x.is_some() && self.y.is_some(), self.relative.is_some()) {
            (true, true) => {}
            (true, false) => transform.sync_relative(surface),
            (false, true) => transform.sync_absolute(surface),
            (false, false) => {
                return Err(DesignError::Serialization(format!(
                    "element {} has neither absolute nor relative position",
                    self.id
                )));
            }
        }
        Ok(Element {
            id: self.id,
            kind: self.kind,
            transform,
            opacity: self.opacity,
            caps: self.caps,
            mask: self.mask,
            visible: self.visible,
            locked: self.locked,
        })
    }
}

/// Serialize a template to its persisted JSON document.
pub fn to_json(template: &Template) -> DesignResult<String> {
    let doc = TemplateDoc {
        schema: SCHEMA_VERSION,
        name: template.name.clone(),
        category: template.category.clone(),
        sides: template
            .sides
            .iter()
            .map(|(name, side)| {
                let side_doc = SideDoc {
                    width: side.surface.width,
                    height: side.surface.height,
                    background: side.background.clone(),
                    elements: side.tree.iter().map(ElementDoc::from_element).collect(),
                };
                (name.clone(), side_doc)
            })
            .collect(),
        settings: template.settings.clone(),
        metadata: template.metadata,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| DesignError::Serialization(e.to_string()))
}

/// Open a persisted JSON document. Fails with [`DesignError::Serialization`]
/// when the document is malformed; a partially-readable template never opens.
pub fn from_json(json: &str) -> DesignResult<Template> {
    let doc: TemplateDoc =
        serde_json::from_str(json).map_err(|e| DesignError::Serialization(e.to_string()))?;
    if doc.schema > SCHEMA_VERSION {
        warn!(
            "template {:?} uses schema {} (newer than {})",
            doc.name, doc.schema, SCHEMA_VERSION
        );
    }

    let mut template = Template::new(doc.name, doc.category);
    template.settings = doc.settings;
    template.metadata = doc.metadata;
    for (name, side_doc) in doc.sides {
        let surface = kurbo::Size::new(side_doc.width, side_doc.height);
        let mut side = Side::new(name, surface);
        side.background = side_doc.background;
        for element_doc in side_doc.elements {
            // Persisted z-indices are authoritative; no reassignment.
            side.tree.push_raw(element_doc.hydrate(surface)?);
        }
        template.add_side(side);
    }
    debug!(
        "loaded template {:?} with {} side(s)",
        template.name,
        template.sides.len()
    );
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;
    use kurbo::{Point, Size};

    fn sample() -> Template {
        let mut template = Template::new("tee-classic", "t-shirt");
        let mut side = Side::new("front", Size::new(400.0, 600.0));
        side.insert(Element::text("Hello", Point::new(50.0, 60.0)));
        side.insert(Element::shape(
            ShapeKind::Star,
            Point::new(100.0, 300.0),
            80.0,
            80.0,
        ));
        template.add_side(side);
        template
    }

    #[test]
    fn test_save_load_round_trip() {
        let template = sample();
        let json = to_json(&template).unwrap();
        let loaded = from_json(&json).unwrap();
        assert_eq!(loaded, template);
    }

    #[test]
    fn test_save_is_idempotent_through_load() {
        let json = to_json(&sample()).unwrap();
        let json_again = to_json(&from_json(&json).unwrap()).unwrap();
        assert_eq!(json, json_again);
    }

    #[test]
    fn test_missing_relative_mirror_is_recomputed() {
        let mut json: serde_json::Value =
            serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        let element = &mut json["sides"]["front"]["elements"][1];
        element.as_object_mut().unwrap().remove("relative");
        element["x"] = 100.0.into();
        element["y"] = 300.0.into();

        let loaded = from_json(&json.to_string()).unwrap();
        let side = loaded.side("front").unwrap();
        let el = side.tree.ordered()[1];
        assert!((el.transform.relative.x - 0.25).abs() < 1e-9);
        assert!((el.transform.relative.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_absolute_is_recomputed() {
        let mut json: serde_json::Value =
            serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        let element = &mut json["sides"]["front"]["elements"][1];
        let obj = element.as_object_mut().unwrap();
        obj.remove("x");
        obj.remove("y");
        element["relative"] = serde_json::json!({"x": 0.5, "y": 0.25});

        let loaded = from_json(&json.to_string()).unwrap();
        let el = loaded.side("front").unwrap().tree.ordered()[1];
        assert!((el.transform.x - 200.0).abs() < 1e-9);
        assert!((el.transform.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_without_any_position_fails() {
        let mut json: serde_json::Value =
            serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        let obj = json["sides"]["front"]["elements"][0].as_object_mut().unwrap();
        obj.remove("x");
        obj.remove("y");
        obj.remove("relative");

        let err = from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, DesignError::Serialization(_)));
    }

    #[test]
    fn test_malformed_document_does_not_open() {
        assert!(matches!(
            from_json("{ not json"),
            Err(DesignError::Serialization(_))
        ));
        assert!(matches!(
            from_json("{\"schema\": 1}"),
            Err(DesignError::Serialization(_))
        ));
    }

    #[test]
    fn test_z_indices_survive_round_trip() {
        let mut template = sample();
        // Leave a gap, as deletions do.
        let side = template.side_mut("front").unwrap();
        let top = side.insert(Element::text("top", Point::ZERO));
        side.tree.by_id_mut(top).unwrap().transform.z_index = 7;

        let loaded = from_json(&to_json(&template).unwrap()).unwrap();
        let el = loaded.side("front").unwrap().tree.by_id(top).unwrap();
        assert_eq!(el.transform.z_index, 7);
    }

    #[test]
    fn test_selection_is_not_persisted() {
        let mut template = sample();
        let id = template.side("front").unwrap().tree.ordered()[0].id;
        template.select_element("front", Some(id)).unwrap();

        let loaded = from_json(&to_json(&template).unwrap()).unwrap();
        assert_eq!(loaded.side("front").unwrap().tree.selected(), None);
    }
}
