use serde::{Deserialize, Serialize};
use slate_core::ObjectId;

use crate::metrics::RenderMetrics;
use crate::visibility::LodLevel;

/// An object the paint step should draw this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderItem {
    pub id: ObjectId,
    pub lod_level: LodLevel,
    /// Distance from the viewport center, in world units.
    pub distance: f64,
    pub selected: bool,
}

/// Output of one virtual-render pass, consumed by the external paint step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    /// Objects to draw. Caller order, or priority order when the frame was capped.
    pub items: Vec<RenderItem>,
    /// Every input object not in `items`.
    pub culled: Vec<ObjectId>,
    pub metrics: RenderMetrics,
    /// Whether the pre-cap candidate count exceeded `maxShapesPerFrame`.
    pub capped: bool,
    /// Whether the pass finished inside `frameTimeTarget`.
    pub within_budget: bool,
}

impl RenderFrame {
    pub fn visible_ids(&self) -> Vec<ObjectId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in draw batches of at most `batch_size`.
    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, RenderItem> {
        self.items.chunks(batch_size.max(1))
    }
}
