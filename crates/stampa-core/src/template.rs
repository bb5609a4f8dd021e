//! The template aggregate: named sides, global settings and quotas.
//!
//! All mutations enter through [`Template`] so that quota enforcement and
//! cross-side synchronization see every change. Operations are all-or-nothing:
//! when any capability, validation or quota check fails, no side is mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::element::{Actor, EditOp, Element, ElementId, ElementKind, ElementPatch};
use crate::error::{DesignError, DesignResult};
use crate::tree::Side;

/// File formats a customer may upload for image elements. Stored on the
/// template and enforced by the upload surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadFormat {
    Jpg,
    Png,
    Svg,
    Pdf,
    PdfWithRasters,
    Eps,
    Ai,
    FacebookPhoto,
}

/// Per-type element limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quotas {
    pub max_images: u32,
    pub max_texts: u32,
}

impl Default for Quotas {
    fn default() -> Self {
        Self {
            max_images: 10,
            max_texts: 5,
        }
    }
}

impl Quotas {
    /// The limit applying to `kind`, if any. Shapes are not quota-tracked.
    pub fn limit_for(&self, kind: &ElementKind) -> Option<(&'static str, u32)> {
        match kind {
            ElementKind::Image(_) => Some(("image", self.max_images)),
            ElementKind::Text(_) => Some(("text", self.max_texts)),
            ElementKind::Shape(_) => None,
        }
    }
}

/// Global template settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Mirror element creations, mutations and removals onto every side.
    pub sync_across_sides: bool,
    pub quotas: Quotas,
    pub allowed_upload_formats: BTreeSet<UploadFormat>,
    pub disable_asset_gallery: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            sync_across_sides: false,
            quotas: Quotas::default(),
            allowed_upload_formats: BTreeSet::from([UploadFormat::Jpg, UploadFormat::Png]),
            disable_asset_gallery: false,
        }
    }
}

/// Versioning metadata, bumped by [`Template::touch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: u64,
    /// Unix seconds of the last touch.
    pub updated_at: u64,
}

/// A customizable product template: its sides, settings and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub category: String,
    pub sides: BTreeMap<String, Side>,
    #[serde(default)]
    pub settings: TemplateSettings,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Template {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            sides: BTreeMap::new(),
            settings: TemplateSettings::default(),
            metadata: Metadata::default(),
        }
    }

    pub fn add_side(&mut self, side: Side) {
        self.sides.insert(side.name.clone(), side);
    }

    pub fn side(&self, name: &str) -> Option<&Side> {
        self.sides.get(name)
    }

    pub fn side_mut(&mut self, name: &str) -> Option<&mut Side> {
        self.sides.get_mut(name)
    }

    fn require_side(&self, name: &str) -> DesignResult<&Side> {
        self.sides
            .get(name)
            .ok_or_else(|| DesignError::validation(format!("no side named {name:?}")))
    }

    /// The quota count for `kind`: the maximum over all sides when syncing
    /// (logical elements appear on every side), else the target side alone.
    fn quota_count(&self, side_name: &str, kind: &ElementKind) -> usize {
        if self.settings.sync_across_sides {
            self.sides
                .values()
                .map(|s| s.quota_count(kind))
                .max()
                .unwrap_or(0)
        } else {
            self.sides
                .get(side_name)
                .map_or(0, |s| s.quota_count(kind))
        }
    }

    /// Add an element to a side, enforcing quotas first.
    ///
    /// With cross-side sync enabled the element is cloned onto every side
    /// under the same id; each clone keeps the shared relative position and
    /// recomputes its absolute position against that side's surface.
    pub fn add_element(&mut self, side_name: &str, element: Element) -> DesignResult<ElementId> {
        self.require_side(side_name)?;

        if let Some((kind, limit)) = self.settings.quotas.limit_for(&element.kind) {
            if self.quota_count(side_name, &element.kind) >= limit as usize {
                return Err(DesignError::QuotaExceeded { kind, limit });
            }
        }

        let id = self
            .sides
            .get_mut(side_name)
            .expect("side existence checked above")
            .insert(element);

        if self.settings.sync_across_sides {
            let source = self.sides[side_name].tree.by_id(id).cloned()
                .expect("element was just inserted");
            let names: Vec<String> = self
                .sides
                .keys()
                .filter(|n| n.as_str() != side_name)
                .cloned()
                .collect();
            for name in names {
                let side = self.sides.get_mut(&name).expect("key from sides");
                let mut clone = source.clone();
                clone.transform.sync_absolute(side.surface);
                side.tree.insert(clone);
            }
            debug!("element {id} mirrored onto {} side(s)", self.sides.len() - 1);
        }

        Ok(id)
    }

    /// Apply a patch to one element, mirroring onto the other sides when
    /// syncing. Position mirrors share the relative coordinate; each side
    /// derives its own absolute position.
    pub fn update_element(
        &mut self,
        side_name: &str,
        id: ElementId,
        patch: &ElementPatch,
        actor: Actor,
    ) -> DesignResult<()> {
        self.require_side(side_name)?;

        let mirror_names: Vec<String> = if self.settings.sync_across_sides {
            self.sides
                .iter()
                .filter(|(name, side)| name.as_str() != side_name && side.tree.contains(id))
                .map(|(name, _)| name.clone())
                .collect()
        } else {
            Vec::new()
        };

        // Pre-flight every copy so a failure on any side mutates nothing.
        for name in std::iter::once(side_name).chain(mirror_names.iter().map(String::as_str)) {
            let side = &self.sides[name];
            let element = side
                .tree
                .by_id(id)
                .ok_or_else(|| DesignError::validation(format!("no element with id {id}")))?;
            patch.validate(element)?;
            for op in patch.ops(element) {
                element.enforce_capability(op, actor)?;
            }
        }

        let source_side = self.sides.get_mut(side_name).expect("side checked above");
        source_side.update(id, patch, actor)?;

        if !mirror_names.is_empty() {
            // Re-express any movement through the shared relative coordinate.
            let mut mirror = patch.clone();
            if patch.x.is_some() || patch.y.is_some() || patch.relative.is_some() {
                let relative = self.sides[side_name]
                    .tree
                    .by_id(id)
                    .expect("source element was just updated")
                    .transform
                    .relative;
                mirror.x = None;
                mirror.y = None;
                mirror.relative = Some(relative);
            }
            for name in &mirror_names {
                self.sides
                    .get_mut(name)
                    .expect("key from sides")
                    .update(id, &mirror, actor)?;
            }
        }

        Ok(())
    }

    /// Remove an element, from every side holding it when syncing.
    pub fn remove_element(
        &mut self,
        side_name: &str,
        id: ElementId,
        actor: Actor,
    ) -> DesignResult<()> {
        self.require_side(side_name)?;

        let names: Vec<String> = if self.settings.sync_across_sides {
            self.sides
                .iter()
                .filter(|(_, side)| side.tree.contains(id))
                .map(|(name, _)| name.clone())
                .collect()
        } else {
            vec![side_name.to_string()]
        };

        // The source copy must exist; mirrors are checked before any removal.
        if !self.sides[side_name].tree.contains(id) {
            return Err(DesignError::validation(format!("no element with id {id}")));
        }
        for name in &names {
            let element = self.sides[name]
                .tree
                .by_id(id)
                .expect("name collected from sides holding the id");
            element.enforce_capability(EditOp::Delete, actor)?;
        }

        for name in &names {
            self.sides
                .get_mut(name)
                .expect("key from sides")
                .remove(id, actor)?;
        }
        Ok(())
    }

    /// Update a side's transient selection.
    pub fn select_element(&mut self, side_name: &str, id: Option<ElementId>) -> DesignResult<()> {
        let side = self
            .sides
            .get_mut(side_name)
            .ok_or_else(|| DesignError::validation(format!("no side named {side_name:?}")))?;
        side.tree.select(id);
        Ok(())
    }

    /// Bump the version and refresh the update timestamp. Editing sessions
    /// call this once per committed change set, before saving.
    pub fn touch(&mut self) {
        self.metadata.version += 1;
        self.metadata.updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
    }

    /// Serialize to the persisted document format. Pure: saving and reloading
    /// a document yields the identical document.
    pub fn save(&self) -> DesignResult<String> {
        crate::doc::to_json(self)
    }

    /// Open a persisted document. Missing coordinate mirrors are recomputed;
    /// malformed documents fail with [`DesignError::Serialization`] and the
    /// template does not open.
    pub fn load(json: &str) -> DesignResult<Self> {
        crate::doc::from_json(json)
    }
}
