//! Per-side element trees.
//!
//! A [`DesignTree`] is an ordered collection of elements with an explicit,
//! persisted z-index. Paint order is the ascending stable sort of that index,
//! with insertion order breaking ties; the live canvas, preview and export
//! paths all use [`DesignTree::ordered`] so they can never disagree.

use crate::color::Rgba;
use crate::element::{Actor, EditOp, Element, ElementId, ElementKind, ElementPatch};
use crate::error::{DesignError, DesignResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Optional side background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The ordered element collection of one side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTree {
    elements: Vec<Element>,
    /// Transient UI state; never persisted.
    #[serde(skip)]
    selected: Option<ElementId>,
}

impl DesignTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn by_id_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.by_id(id).is_some()
    }

    /// Elements in canonical paint order: ascending z-index, stable, so
    /// equal indices fall back to insertion order.
    pub fn ordered(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.transform.z_index);
        ordered
    }

    /// Number of elements whose kind matches `name` ("text", "shape", "image").
    pub fn count_of(&self, name: &str) -> usize {
        self.elements.iter().filter(|e| e.kind.name() == name).count()
    }

    fn next_z_index(&self) -> u32 {
        self.elements
            .iter()
            .map(|e| e.transform.z_index)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Append an element on top of the stack.
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        element.transform.z_index = self.next_z_index();
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Append an element keeping its stored z-index. Used when rebuilding a
    /// tree from a persisted document.
    pub(crate) fn push_raw(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Remove an element. Remaining z-indices keep their values; ordering is
    /// already total without renumbering.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(index))
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.contains(*id));
    }
}

/// One printable face of the product: a reference surface, an optional
/// background and the element tree placed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub name: String,
    pub surface: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    pub tree: DesignTree,
}

impl Side {
    pub fn new(name: impl Into<String>, surface: Size) -> Self {
        Self {
            name: name.into(),
            surface,
            background: None,
            tree: DesignTree::new(),
        }
    }

    /// Insert an element, computing its relative mirror against this side's
    /// surface.
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        element.transform.sync_relative(self.surface);
        self.tree.insert(element)
    }

    /// Apply a validated, capability-checked patch to one element.
    ///
    /// Fails without mutating anything when validation or a capability check
    /// rejects the patch.
    pub fn update(
        &mut self,
        id: ElementId,
        patch: &ElementPatch,
        actor: Actor,
    ) -> DesignResult<()> {
        let element = self
            .tree
            .by_id(id)
            .ok_or_else(|| DesignError::validation(format!("no element with id {id}")))?;
        patch.validate(element)?;
        for op in patch.ops(element) {
            element.enforce_capability(op, actor)?;
        }
        let surface = self.surface;
        // Checks passed; the lookup cannot fail now.
        if let Some(element) = self.tree.by_id_mut(id) {
            patch.apply_to(element, surface);
        }
        Ok(())
    }

    /// Remove an element, honoring its deletion capability.
    pub fn remove(&mut self, id: ElementId, actor: Actor) -> DesignResult<Element> {
        let element = self
            .tree
            .by_id(id)
            .ok_or_else(|| DesignError::validation(format!("no element with id {id}")))?;
        element.enforce_capability(EditOp::Delete, actor)?;
        Ok(self.tree.remove(id).unwrap())
    }

    /// Resize the reference surface, recomputing every element's absolute
    /// position from its relative mirror.
    pub fn set_surface(&mut self, surface: Size) {
        self.surface = surface;
        for element in &mut self.tree.elements {
            element.transform.sync_absolute(surface);
        }
    }

    /// Count elements for quota purposes. Text and image elements are
    /// quota-tracked; shapes are not.
    pub fn quota_count(&self, kind: &ElementKind) -> usize {
        self.tree.count_of(kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;
    use kurbo::Point;

    fn side() -> Side {
        Side::new("front", Size::new(400.0, 600.0))
    }

    #[test]
    fn test_insert_assigns_ascending_z() {
        let mut side = side();
        let a = side.insert(Element::shape(ShapeKind::Circle, Point::ZERO, 10.0, 10.0));
        let b = side.insert(Element::text("hi", Point::ZERO));
        assert_eq!(side.tree.by_id(a).unwrap().transform.z_index, 0);
        assert_eq!(side.tree.by_id(b).unwrap().transform.z_index, 1);
    }

    #[test]
    fn test_paint_order_stable_for_ties() {
        let mut side = side();
        let a = side.insert(Element::shape(ShapeKind::Circle, Point::ZERO, 10.0, 10.0));
        let b = side.insert(Element::shape(ShapeKind::Star, Point::ZERO, 10.0, 10.0));
        // Force a tie; insertion order must break it.
        side.tree.by_id_mut(b).unwrap().transform.z_index = 0;
        let ordered: Vec<ElementId> = side.tree.ordered().iter().map(|e| e.id).collect();
        assert_eq!(ordered, vec![a, b]);
    }

    #[test]
    fn test_remove_keeps_survivor_order() {
        let mut side = side();
        let a = side.insert(Element::shape(ShapeKind::Circle, Point::ZERO, 10.0, 10.0));
        let b = side.insert(Element::shape(ShapeKind::Star, Point::ZERO, 10.0, 10.0));
        let c = side.insert(Element::shape(ShapeKind::Heart, Point::ZERO, 10.0, 10.0));
        side.remove(b, Actor::Admin).unwrap();
        let ordered: Vec<ElementId> = side.tree.ordered().iter().map(|e| e.id).collect();
        assert_eq!(ordered, vec![a, c]);
        // No renumbering on delete.
        assert_eq!(side.tree.by_id(c).unwrap().transform.z_index, 2);
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut side = side();
        let id = side.insert(Element::shape(ShapeKind::Circle, Point::ZERO, 10.0, 10.0));
        // Valid move plus invalid resize in one patch.
        let patch = ElementPatch::new().position(50.0, 50.0).size(-1.0, 20.0);
        assert!(side.update(id, &patch, Actor::Admin).is_err());
        let el = side.tree.by_id(id).unwrap();
        assert_eq!(el.transform.x, 0.0);
        assert_eq!(el.transform.width, 10.0);
    }

    #[test]
    fn test_remove_honors_can_delete() {
        let mut side = side();
        let id = side.insert(Element::shape(ShapeKind::Circle, Point::ZERO, 10.0, 10.0));
        side.tree.by_id_mut(id).unwrap().caps.can_delete = false;
        assert!(side.remove(id, Actor::Customer).is_err());
        assert_eq!(side.tree.len(), 1);
        side.remove(id, Actor::Admin).unwrap();
        assert!(side.tree.is_empty());
    }

    #[test]
    fn test_set_surface_rescales_positions() {
        let mut side = side();
        let id = side.insert(Element::shape(ShapeKind::Circle, Point::new(100.0, 300.0), 10.0, 10.0));
        side.set_surface(Size::new(800.0, 600.0));
        let el = side.tree.by_id(id).unwrap();
        assert!((el.transform.x - 200.0).abs() < 1e-9);
        assert!((el.transform.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_is_cleared_on_remove() {
        let mut side = side();
        let id = side.insert(Element::text("x", Point::ZERO));
        side.tree.select(Some(id));
        assert_eq!(side.tree.selected(), Some(id));
        side.remove(id, Actor::Admin).unwrap();
        assert_eq!(side.tree.selected(), None);
    }

    #[test]
    fn test_select_unknown_id_is_noop() {
        let mut side = side();
        side.tree.select(Some(uuid::Uuid::new_v4()));
        assert_eq!(side.tree.selected(), None);
    }
}
