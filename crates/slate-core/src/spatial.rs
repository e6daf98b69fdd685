//! Loose quadtree over object bounds.
//!
//! Each object lives in exactly one node: the deepest node whose quadrant
//! fully contains its bounds. Objects straddling a quadrant boundary stay in
//! the parent, so a query never sees the same id twice and never misses one.

use std::collections::HashSet;
use std::mem::size_of;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};
use crate::scene::{DrawableObject, ObjectId};

/// World bounds used when the index is built from an empty object set.
pub const DEFAULT_WORLD_SIZE: f64 = 1000.0;

/// Subdivision limits for the quadtree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpatialConfig {
    pub max_depth: u32,
    pub max_objects_per_node: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_objects_per_node: 10,
        }
    }
}

/// An entry in the quadtree, referencing an object by id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: ObjectId,
    pub bbox: BoundingBox,
}

/// One quadtree node.
#[derive(Debug, Clone)]
pub struct SpatialNode {
    pub bounds: BoundingBox,
    pub level: u32,
    entries: Vec<SpatialEntry>,
    children: Option<Box<[SpatialNode; 4]>>,
}

impl SpatialNode {
    fn new(bounds: BoundingBox, level: u32) -> Self {
        Self {
            bounds,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    /// Ids owned directly by this node (not its children).
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn children(&self) -> Option<&[SpatialNode; 4]> {
        self.children.as_deref()
    }

    fn insert(&mut self, entry: SpatialEntry, config: &SpatialConfig) {
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&entry.bbox)) {
                child.insert(entry, config);
                return;
            }
            self.entries.push(entry);
            return;
        }

        self.entries.push(entry);
        if self.entries.len() > config.max_objects_per_node && self.level < config.max_depth {
            self.subdivide(config);
        }
    }

    fn subdivide(&mut self, config: &SpatialConfig) {
        let [nw, ne, sw, se] = self.bounds.quadrants();
        let level = self.level + 1;
        self.children = Some(Box::new([
            SpatialNode::new(nw, level),
            SpatialNode::new(ne, level),
            SpatialNode::new(sw, level),
            SpatialNode::new(se, level),
        ]));

        let pending = std::mem::take(&mut self.entries);
        for entry in pending {
            self.insert(entry, config);
        }
    }

    fn remove(&mut self, id: &ObjectId, bbox: &BoundingBox) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.id == *id) {
            self.entries.swap_remove(pos);
            return true;
        }
        match self.children.as_mut() {
            Some(children) => children
                .iter_mut()
                .filter(|c| c.bounds.intersects(bbox))
                .any(|c| c.remove(id, bbox)),
            None => false,
        }
    }

    fn query(&self, area: &BoundingBox, out: &mut HashSet<ObjectId>) {
        if !self.bounds.intersects(area) {
            return;
        }
        out.extend(
            self.entries
                .iter()
                .filter(|e| e.bbox.intersects(area))
                .map(|e| e.id),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(area, out);
            }
        }
    }

    fn query_point(&self, point: &Point, out: &mut Vec<ObjectId>) {
        if !self.bounds.contains_point(point) {
            return;
        }
        out.extend(
            self.entries
                .iter()
                .filter(|e| e.bbox.contains_point(point))
                .map(|e| e.id),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_point(point, out);
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(SpatialNode::node_count).sum())
    }

    fn depth(&self) -> u32 {
        self.children
            .as_ref()
            .map_or(self.level, |c| c.iter().map(SpatialNode::depth).max().unwrap_or(self.level))
    }
}

/// Spatial index for fast viewport culling and point queries.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: SpatialNode,
    config: SpatialConfig,
    world_bounds: BoundingBox,
    len: usize,
    skipped: usize,
}

impl SpatialIndex {
    pub fn new(config: SpatialConfig) -> Self {
        let world = BoundingBox::new(0.0, 0.0, DEFAULT_WORLD_SIZE, DEFAULT_WORLD_SIZE);
        Self {
            root: SpatialNode::new(world, 0),
            config,
            world_bounds: world,
            len: 0,
            skipped: 0,
        }
    }

    /// Build the index from the current object set.
    ///
    /// Objects with non-finite bounds are skipped and counted in [`SpatialIndex::skipped`].
    pub fn build<'a, I>(objects: I, config: SpatialConfig) -> Self
    where
        I: IntoIterator<Item = &'a DrawableObject>,
    {
        let mut skipped = 0;
        let entries: Vec<SpatialEntry> = objects
            .into_iter()
            .filter_map(|obj| match obj.bounding_box() {
                Some(bbox) => Some(SpatialEntry { id: obj.id, bbox }),
                None => {
                    log::warn!("Skipping object {} with malformed bounds {:?}", obj.id, obj.bounds);
                    skipped += 1;
                    None
                }
            })
            .collect();

        let Some(world) = entries
            .iter()
            .map(|e| e.bbox)
            .reduce(|acc, bb| acc.union(&bb))
        else {
            let mut index = Self::new(config);
            index.skipped = skipped;
            return index;
        };

        let mut root = SpatialNode::new(world, 0);
        let len = entries.len();
        for entry in entries {
            root.insert(entry, &config);
        }

        log::debug!(
            "Built spatial index: {} objects, {} nodes, depth {}",
            len,
            root.node_count(),
            root.depth()
        );

        Self {
            root,
            config,
            world_bounds: world,
            len,
            skipped,
        }
    }

    /// Insert a single object.
    ///
    /// Returns `false` if the object's bounds are malformed or fall outside the
    /// world bounds; the caller must rebuild in that case.
    pub fn insert(&mut self, object: &DrawableObject) -> bool {
        match object.bounding_box() {
            Some(bbox) if self.world_bounds.contains(&bbox) => {
                self.root.insert(SpatialEntry { id: object.id, bbox }, &self.config);
                self.len += 1;
                true
            }
            _ => false,
        }
    }

    /// Remove an object, located through its current bounds.
    pub fn remove(&mut self, object: &DrawableObject) -> bool {
        let Some(bbox) = object.bounding_box() else {
            return false;
        };
        let removed = self.root.remove(&object.id, &bbox);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Ids of all objects whose bounds intersect `area`. Never contains duplicates.
    pub fn query(&self, area: &BoundingBox) -> HashSet<ObjectId> {
        let mut out = HashSet::new();
        self.root.query(area, &mut out);
        out
    }

    /// Ids of all objects whose bounds contain `point`.
    pub fn query_point(&self, point: &Point) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.root.query_point(point, &mut out);
        out
    }

    pub fn root(&self) -> &SpatialNode {
        &self.root
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    pub fn world_bounds(&self) -> BoundingBox {
        self.world_bounds
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of objects rejected for malformed bounds during the last build.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    /// Rough heap footprint of the tree.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.node_count() * size_of::<SpatialNode>() + self.len * size_of::<SpatialEntry>()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(SpatialConfig::default())
    }
}
