//! Per-object frustum test, LOD classification and the frame-bounded visibility cache.

use std::collections::HashMap;
use std::mem::size_of;

use serde::{Deserialize, Serialize};
use slate_core::{BoundingBox, DrawableObject, ObjectId};

use crate::config::{LodThresholds, VirtualRenderConfig};
use crate::viewport::Viewport;

/// Cache size above which stale entries are evicted.
pub const CACHE_CAPACITY: usize = 1000;
/// Entries unseen for more than this many frames are evictable.
pub const CACHE_MAX_AGE_FRAMES: u64 = 100;
/// A zoom change larger than this invalidates the whole cache.
pub const SCALE_INVALIDATION_DELTA: f64 = 0.1;

/// Level of detail an object is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodLevel {
    Full,
    Simple,
    Hidden,
}

impl LodLevel {
    /// Classify a zoom factor. Selected objects always render in full.
    pub fn for_scale(scale: f64, thresholds: &LodThresholds, selected: bool) -> Self {
        if selected {
            LodLevel::Full
        } else if scale < thresholds.hidden {
            LodLevel::Hidden
        } else if scale < thresholds.simple {
            LodLevel::Simple
        } else {
            LodLevel::Full
        }
    }
}

/// Visibility verdict for one object against one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeVisibility {
    pub id: ObjectId,
    /// Bounds intersect the padded viewport and LOD is not hidden.
    pub is_visible: bool,
    /// Bounds intersect the padded viewport, regardless of LOD.
    pub in_viewport: bool,
    /// Distance from the object's center to the viewport center.
    pub distance: f64,
    pub lod_level: LodLevel,
    pub last_visible_frame: u64,
    /// Always false; occlusion culling is not performed.
    pub is_occluded: bool,
}

impl ShapeVisibility {
    /// Evaluate `object` (with normalized bounds `bbox`) against `viewport`.
    pub fn compute(
        object: &DrawableObject,
        bbox: &BoundingBox,
        viewport: &Viewport,
        config: &VirtualRenderConfig,
        frame: u64,
    ) -> Self {
        let padded = viewport.padded_bounds(config.viewport_padding);
        let in_viewport = bbox.intersects(&padded);
        let distance = bbox.center().distance_to(&viewport.center());
        let lod_level = if config.lod_enabled {
            LodLevel::for_scale(viewport.scale, &config.lod_thresholds, object.selected)
        } else {
            LodLevel::Full
        };

        Self {
            id: object.id,
            is_visible: in_viewport && lod_level != LodLevel::Hidden,
            in_viewport,
            distance,
            lod_level,
            last_visible_frame: frame,
            is_occluded: false,
        }
    }
}

/// Bit-exact snapshot of the viewport, usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ViewportKey {
    x: u64,
    y: u64,
    width: u64,
    height: u64,
    scale: u64,
}

impl From<&Viewport> for ViewportKey {
    fn from(vp: &Viewport) -> Self {
        Self {
            x: vp.x.to_bits(),
            y: vp.y.to_bits(),
            width: vp.width.to_bits(),
            height: vp.height.to_bits(),
            scale: vp.scale.to_bits(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    id: ObjectId,
    viewport: ViewportKey,
    selected: bool,
}

/// Hit/miss counters for the visibility cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

/// Resolves object visibility and memoizes the result per viewport snapshot.
#[derive(Debug, Default)]
pub struct VisibilityResolver {
    cache: HashMap<CacheKey, ShapeVisibility>,
    frame: u64,
    last_scale: Option<f64>,
    last_eviction_frame: Option<u64>,
    stats: CacheStats,
}

impl VisibilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the frame counter. Clears the cache on a large zoom change
    /// and returns whether it did.
    pub fn begin_frame(&mut self, viewport: &Viewport) -> bool {
        self.frame += 1;
        let mut invalidated = false;
        if let Some(last) = self.last_scale {
            if (viewport.scale - last).abs() > SCALE_INVALIDATION_DELTA {
                log::debug!(
                    "Scale changed {:.3} -> {:.3}, invalidating {} cached entries",
                    last,
                    viewport.scale,
                    self.cache.len()
                );
                self.invalidate();
                invalidated = true;
            }
        }
        self.last_scale = Some(viewport.scale);
        invalidated
    }

    /// Resolve one object. Returns `None` for malformed bounds.
    pub fn resolve(
        &mut self,
        object: &DrawableObject,
        viewport: &Viewport,
        config: &VirtualRenderConfig,
    ) -> Option<ShapeVisibility> {
        let key = CacheKey {
            id: object.id,
            viewport: ViewportKey::from(viewport),
            selected: object.selected,
        };

        if let Some(entry) = self.cache.get_mut(&key) {
            entry.last_visible_frame = self.frame;
            self.stats.hits += 1;
            return Some(*entry);
        }

        let bbox = object.bounding_box()?;
        let visibility = ShapeVisibility::compute(object, &bbox, viewport, config, self.frame);
        self.stats.misses += 1;
        self.cache.insert(key, visibility);

        if self.cache.len() > CACHE_CAPACITY && self.last_eviction_frame != Some(self.frame) {
            self.last_eviction_frame = Some(self.frame);
            self.evict_stale();
            if config.enable_memory_optimization && self.cache.len() > CACHE_CAPACITY {
                self.evict_previous_frames();
            }
        }
        Some(visibility)
    }

    /// Drop entries unseen for more than [`CACHE_MAX_AGE_FRAMES`] frames.
    pub fn evict_stale(&mut self) -> usize {
        let frame = self.frame;
        let before = self.cache.len();
        self.cache
            .retain(|_, v| frame.saturating_sub(v.last_visible_frame) <= CACHE_MAX_AGE_FRAMES);
        let evicted = before - self.cache.len();
        if evicted > 0 {
            log::debug!("Evicted {} stale visibility entries", evicted);
            self.stats.evictions += evicted as u64;
        }
        evicted
    }

    /// Drop everything not resolved during the current frame.
    fn evict_previous_frames(&mut self) -> usize {
        let frame = self.frame;
        let before = self.cache.len();
        self.cache.retain(|_, v| v.last_visible_frame == frame);
        let evicted = before - self.cache.len();
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Clear every cached verdict.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.stats.invalidations += 1;
    }

    /// Clear the cache, counters and frame index.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            ..self.stats
        }
    }

    pub fn estimated_memory_bytes(&self) -> usize {
        self.cache.len() * (size_of::<CacheKey>() + size_of::<ShapeVisibility>())
    }
}
