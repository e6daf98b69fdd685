use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BoundingBox, Bounds};

/// Stable identifier of a drawable object.
pub type ObjectId = Uuid;

/// A drawable object as seen by the rendering pipeline.
///
/// Compound objects are stored flat: children are referenced by id and point
/// back at their parent, so the pipeline can treat every object uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableObject {
    pub id: ObjectId,
    pub bounds: Bounds,
    #[serde(default)]
    pub z_index: i32,
    /// Hierarchy depth; 0 is a top-level, selectable object.
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectId>,
}

impl DrawableObject {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_id(Uuid::new_v4(), bounds)
    }

    pub fn with_id(id: ObjectId, bounds: Bounds) -> Self {
        Self {
            id,
            bounds,
            z_index: 0,
            level: 0,
            selected: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Convenience constructor from corner coordinates.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Bounds::new(x1, y1, x2, y2))
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Normalized bounds, `None` when the geometry is malformed.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds.to_bbox()
    }
}

/// Id-indexed arena of drawable objects.
///
/// The revision counter bumps on every structural or geometric change so
/// callers can tell the renderer when its spatial index is stale.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    objects: HashMap<ObjectId, DrawableObject>,
    /// Paint order (insertion order).
    order: Vec<ObjectId>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Object management ────────────────────────────────────────────

    pub fn add_object(&mut self, mut object: DrawableObject) -> ObjectId {
        let id = object.id;
        object.parent = None;
        object.level = 0;
        self.insert(object);
        id
    }

    /// Add `object` as a child of `parent`. Returns `None` if the parent is unknown.
    pub fn add_child(&mut self, parent: &ObjectId, mut object: DrawableObject) -> Option<ObjectId> {
        let parent_obj = self.objects.get_mut(parent)?;
        let id = object.id;
        parent_obj.children.push(id);
        object.parent = Some(*parent);
        object.level = parent_obj.level + 1;
        self.insert(object);
        Some(id)
    }

    fn insert(&mut self, object: DrawableObject) {
        let id = object.id;
        if self.objects.insert(id, object).is_none() {
            self.order.push(id);
        }
        self.revision += 1;
    }

    pub fn get(&self, id: &ObjectId) -> Option<&DrawableObject> {
        self.objects.get(id)
    }

    /// Move an object. Children are not translated.
    pub fn set_bounds(&mut self, id: &ObjectId, bounds: Bounds) -> bool {
        match self.objects.get_mut(id) {
            Some(obj) => {
                obj.bounds = bounds;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Selection does not affect geometry, so it leaves the revision untouched.
    pub fn set_selected(&mut self, id: &ObjectId, selected: bool) -> bool {
        match self.objects.get_mut(id) {
            Some(obj) => {
                obj.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Remove an object together with all of its descendants.
    pub fn remove(&mut self, id: &ObjectId) -> Vec<DrawableObject> {
        let Some(parent) = self.objects.get(id).map(|o| o.parent) else {
            return Vec::new();
        };
        if let Some(parent_id) = parent {
            if let Some(parent) = self.objects.get_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![*id];
        while let Some(next) = stack.pop() {
            if let Some(obj) = self.objects.remove(&next) {
                stack.extend(obj.children.iter().copied());
                removed.push(obj);
            }
        }
        self.order.retain(|oid| self.objects.contains_key(oid));
        self.revision += 1;
        removed
    }

    /// All descendants of `id`, depth-first.
    pub fn descendants(&self, id: &ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<ObjectId> = self
            .objects
            .get(id)
            .map(|o| o.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(obj) = self.objects.get(&next) {
                out.push(next);
                stack.extend(obj.children.iter().rev().copied());
            }
        }
        out
    }

    /// Objects in paint order, flattened across the hierarchy.
    pub fn objects(&self) -> impl Iterator<Item = &DrawableObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    /// Snapshot of the flattened object list, as handed to the renderer each frame.
    pub fn to_vec(&self) -> Vec<DrawableObject> {
        self.objects().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
