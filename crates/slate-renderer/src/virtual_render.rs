//! Per-frame visible-set resolution: index query, culling, LOD, priority cap.

use std::collections::HashSet;
use std::mem::size_of;
use std::time::Instant;

use slate_core::time::timestamp_ms;
use slate_core::{ConfigError, DrawableObject, ObjectId, Scene, SpatialIndex};

use crate::config::VirtualRenderConfig;
use crate::metrics::{MetricsRecorder, RenderMetrics, DEFAULT_HISTORY_SIZE};
use crate::render_data::{RenderFrame, RenderItem};
use crate::visibility::{LodLevel, ShapeVisibility, VisibilityResolver};
use crate::viewport::Viewport;

/// Owns the spatial index, visibility cache and frame metrics for one canvas.
#[derive(Debug)]
pub struct VirtualRenderer {
    config: VirtualRenderConfig,
    index: Option<SpatialIndex>,
    resolver: VisibilityResolver,
    recorder: MetricsRecorder,
    scene_revision: Option<u64>,
}

impl VirtualRenderer {
    pub fn new(config: VirtualRenderConfig) -> Result<Self, ConfigError> {
        Self::with_history_size(config, DEFAULT_HISTORY_SIZE)
    }

    /// Like [`VirtualRenderer::new`], keeping `history_size` frames of metrics.
    pub fn with_history_size(config: VirtualRenderConfig, history_size: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            index: None,
            resolver: VisibilityResolver::new(),
            recorder: MetricsRecorder::new(history_size),
            scene_revision: None,
        })
    }

    pub fn config(&self) -> &VirtualRenderConfig {
        &self.config
    }

    /// Swap the active configuration; takes effect on the next frame.
    pub fn set_config(&mut self, config: VirtualRenderConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.spatial != self.config.spatial {
            self.index = None;
        }
        self.config = config;
        self.resolver.invalidate();
        Ok(())
    }

    /// Signal that objects were added, removed or moved.
    pub fn mark_objects_changed(&mut self) {
        self.index = None;
        self.resolver.invalidate();
    }

    /// Clear the index, visibility cache and metric history.
    pub fn reset(&mut self) {
        self.index = None;
        self.resolver.reset();
        self.recorder.clear();
        self.scene_revision = None;
    }

    pub fn index(&self) -> Option<&SpatialIndex> {
        self.index.as_ref()
    }

    pub fn resolver(&self) -> &VisibilityResolver {
        &self.resolver
    }

    pub fn recorder(&self) -> &MetricsRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut MetricsRecorder {
        &mut self.recorder
    }

    /// Render a [`Scene`], rebuilding the index when its revision moved.
    pub fn render_scene(&mut self, scene: &Scene, viewport: &Viewport) -> RenderFrame {
        if self.scene_revision != Some(scene.revision()) {
            self.mark_objects_changed();
            self.scene_revision = Some(scene.revision());
        }
        let objects: Vec<&DrawableObject> = scene.objects().collect();
        self.render(&objects, viewport)
    }

    /// Resolve the visible set for `objects` and record the frame's metrics.
    ///
    /// The index is built from the first object set it sees; call
    /// [`VirtualRenderer::mark_objects_changed`] whenever that set changes.
    pub fn get_visible_set(&mut self, objects: &[DrawableObject], viewport: &Viewport) -> RenderFrame {
        let objects: Vec<&DrawableObject> = objects.iter().collect();
        self.render(&objects, viewport)
    }

    fn render(&mut self, objects: &[&DrawableObject], viewport: &Viewport) -> RenderFrame {
        let start = Instant::now();
        let config = self.config.clone();
        if self.resolver.begin_frame(viewport) {
            log::debug!("Large zoom change, dropping {} frames of metric history", self.recorder.len());
            self.recorder.clear_history();
        }

        if config.enable_spatial_index && self.index.is_none() {
            let index = SpatialIndex::build(objects.iter().copied(), config.spatial);
            log::info!(
                "Rebuilt spatial index over {} objects ({} nodes)",
                index.len(),
                index.node_count()
            );
            self.index = Some(index);
        }

        let mut viewport_queries = 0;
        // Objects with malformed bounds never enter the index, so on the
        // indexed path they are counted from the last build.
        let mut skipped = 0;
        let hits = match (&self.index, config.culling_enabled && config.enable_spatial_index) {
            (Some(index), true) => {
                viewport_queries += 1;
                skipped = index.skipped();
                Some(index.query(&viewport.padded_bounds(config.viewport_padding)))
            }
            _ => None,
        };

        let mut kept: Vec<(&DrawableObject, ShapeVisibility)> = Vec::new();
        for &object in objects {
            if hits.as_ref().is_some_and(|h| !h.contains(&object.id)) {
                continue;
            }
            let Some(vis) = self.resolver.resolve(object, viewport, &config) else {
                log::debug!("Skipping object {} with malformed bounds {:?}", object.id, object.bounds);
                skipped += 1;
                continue;
            };
            if config.culling_enabled && !vis.in_viewport {
                continue;
            }
            if config.lod_enabled && vis.lod_level == LodLevel::Hidden {
                continue;
            }
            kept.push((object, vis));
        }

        let capped = kept.len() > config.max_shapes_per_frame;
        if capped {
            kept.sort_by(|(a, va), (b, vb)| {
                b.selected
                    .cmp(&a.selected)
                    .then_with(|| va.distance.total_cmp(&vb.distance))
            });
            kept.truncate(config.max_shapes_per_frame);
        }

        let items: Vec<RenderItem> = kept
            .iter()
            .map(|(object, vis)| RenderItem {
                id: object.id,
                lod_level: vis.lod_level,
                distance: vis.distance,
                selected: object.selected,
            })
            .collect();
        let rendered: HashSet<ObjectId> = items.iter().map(|item| item.id).collect();
        let culled: Vec<ObjectId> = objects
            .iter()
            .map(|o| o.id)
            .filter(|id| !rendered.contains(id))
            .collect();

        let frame_time = start.elapsed().as_secs_f64() * 1000.0;
        let metrics = RenderMetrics {
            frame_time,
            shapes_rendered: items.len(),
            shapes_culled: culled.len(),
            shapes_skipped: skipped,
            draw_calls: items.len().div_ceil(config.batch_size),
            memory_usage: self.estimated_memory_bytes(objects.len()),
            viewport_queries,
            timestamp: timestamp_ms(),
        };
        self.recorder.record(metrics);

        log::debug!(
            "Frame {}: {} rendered, {} culled, {:.3} ms",
            self.resolver.frame(),
            metrics.shapes_rendered,
            metrics.shapes_culled,
            frame_time
        );

        RenderFrame {
            items,
            culled,
            metrics,
            capped,
            within_budget: frame_time <= config.frame_time_target,
        }
    }

    fn estimated_memory_bytes(&self, object_count: usize) -> usize {
        let index = self.index.as_ref().map_or(0, SpatialIndex::estimated_memory_bytes);
        index + self.resolver.estimated_memory_bytes() + object_count * size_of::<DrawableObject>()
    }
}

impl Default for VirtualRenderer {
    fn default() -> Self {
        Self {
            config: VirtualRenderConfig::default(),
            index: None,
            resolver: VisibilityResolver::new(),
            recorder: MetricsRecorder::default(),
            scene_revision: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scattered(n: usize) -> Vec<DrawableObject> {
        // Half inside a 1000x1000 viewport, half far outside.
        (0..n)
            .map(|i| {
                let x = (i % 50) as f64 * 18.0;
                let y = (i / 50) as f64 * 18.0;
                let offset = if i % 2 == 0 { 0.0 } else { 10_000.0 };
                DrawableObject::from_corners(x + offset, y, x + offset + 10.0, y + 10.0)
            })
            .collect()
    }

    #[test]
    fn test_scenario_near_and_far() {
        let mut renderer = VirtualRenderer::default();
        let vp = Viewport::new(0.0, 0.0, 1000.0, 1000.0, 1.0);
        let far = DrawableObject::from_corners(2000.0, 2000.0, 2010.0, 2010.0);
        let near = DrawableObject::from_corners(50.0, 50.0, 60.0, 60.0);

        let frame = renderer.get_visible_set(&[far.clone(), near.clone()], &vp);
        assert_eq!(frame.visible_ids(), vec![near.id]);
        assert_eq!(frame.culled, vec![far.id]);
        assert_eq!(frame.items[0].lod_level, LodLevel::Full);
    }

    #[test]
    fn test_visible_plus_culled_is_total() {
        let objects = scattered(400);
        let mut renderer = VirtualRenderer::default();
        let vp = Viewport::new(0.0, 0.0, 1000.0, 1000.0, 1.0);
        let frame = renderer.get_visible_set(&objects, &vp);

        assert_eq!(frame.items.len() + frame.culled.len(), objects.len());
        assert_eq!(frame.items.len(), 200);
        assert_eq!(frame.metrics.total_shapes(), 400);
        assert_eq!(frame.metrics.viewport_queries, 1);
        assert_eq!(frame.metrics.draw_calls, 4);
    }

    #[test]
    fn test_index_and_scan_agree() {
        let objects = scattered(600);
        let vp = Viewport::new(100.0, 50.0, 400.0, 300.0, 1.0);

        let mut indexed = VirtualRenderer::default();
        let mut scanning = VirtualRenderer::new(VirtualRenderConfig {
            enable_spatial_index: false,
            ..Default::default()
        })
        .unwrap();

        let a: HashSet<_> = indexed.get_visible_set(&objects, &vp).visible_ids().into_iter().collect();
        let b: HashSet<_> = scanning.get_visible_set(&objects, &vp).visible_ids().into_iter().collect();
        assert_eq!(a, b);
        assert!(scanning.index().is_none());
    }

    #[test]
    fn test_lod_hidden_counted_as_culled() {
        let objects = vec![
            DrawableObject::from_corners(0.0, 0.0, 10.0, 10.0),
            DrawableObject::from_corners(20.0, 20.0, 30.0, 30.0).selected(true),
        ];
        let mut renderer = VirtualRenderer::default();
        let vp = Viewport::new(0.0, 0.0, 1000.0, 1000.0, 0.05);
        let frame = renderer.get_visible_set(&objects, &vp);

        assert_eq!(frame.visible_ids(), vec![objects[1].id]);
        assert_eq!(frame.culled, vec![objects[0].id]);
    }

    #[test]
    fn test_cap_keeps_selected_and_nearest() {
        let mut objects: Vec<DrawableObject> = (0..1500)
            .map(|i| {
                let x = (i % 40) as f64 * 20.0;
                let y = (i / 40) as f64 * 20.0;
                DrawableObject::from_corners(x, y, x + 5.0, y + 5.0)
            })
            .collect();
        for i in [3, 700, 1499] {
            objects[i].selected = true;
        }
        let config = VirtualRenderConfig {
            viewport_padding: 10_000.0,
            ..Default::default()
        };
        let mut renderer = VirtualRenderer::new(config).unwrap();
        let vp = Viewport::new(0.0, 0.0, 800.0, 800.0, 1.0);
        let frame = renderer.get_visible_set(&objects, &vp);

        assert!(frame.capped);
        assert_eq!(frame.len(), 1000);
        let ids: HashSet<_> = frame.visible_ids().into_iter().collect();
        for i in [3, 700, 1499] {
            assert!(ids.contains(&objects[i].id));
        }
        assert!(frame.items[..3].iter().all(|item| item.selected));
        let rest = &frame.items[3..];
        assert!(rest.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(frame.culled.len(), 500);
    }

    #[test]
    fn test_culling_disabled_renders_everything() {
        let objects = scattered(100);
        let config = VirtualRenderConfig {
            culling_enabled: false,
            lod_enabled: false,
            enable_spatial_index: false,
            max_shapes_per_frame: usize::MAX,
            ..Default::default()
        };
        let mut renderer = VirtualRenderer::new(config).unwrap();
        let vp = Viewport::new(0.0, 0.0, 100.0, 100.0, 0.01);
        let frame = renderer.get_visible_set(&objects, &vp);
        assert_eq!(frame.len(), 100);
        assert!(frame.items.iter().all(|i| i.lod_level == LodLevel::Full));
        assert_eq!(frame.metrics.viewport_queries, 0);
    }

    #[test]
    fn test_malformed_objects_skipped() {
        let objects = vec![
            DrawableObject::from_corners(0.0, 0.0, 10.0, 10.0),
            DrawableObject::from_corners(f64::INFINITY, 0.0, 10.0, 10.0),
            DrawableObject::from_corners(f64::NAN, 50.0, 60.0, 60.0),
        ];
        for spatial in [true, false] {
            let mut renderer = VirtualRenderer::new(VirtualRenderConfig {
                enable_spatial_index: spatial,
                ..Default::default()
            })
            .unwrap();
            let frame = renderer.get_visible_set(&objects, &Viewport::default());
            assert_eq!(frame.visible_ids(), vec![objects[0].id]);
            assert_eq!(frame.culled, vec![objects[1].id, objects[2].id]);
            assert_eq!(frame.metrics.shapes_skipped, 2);
        }
    }

    #[test]
    fn test_scene_revision_triggers_rebuild() {
        let mut scene = Scene::new();
        scene.add_object(DrawableObject::from_corners(0.0, 0.0, 10.0, 10.0));
        let mut renderer = VirtualRenderer::default();
        let vp = Viewport::default();

        assert_eq!(renderer.render_scene(&scene, &vp).len(), 1);
        let added = scene.add_object(DrawableObject::from_corners(30.0, 30.0, 40.0, 40.0));
        let frame = renderer.render_scene(&scene, &vp);
        assert_eq!(frame.len(), 2);
        assert!(frame.visible_ids().contains(&added));
        assert_eq!(renderer.index().unwrap().len(), 2);
    }

    #[test]
    fn test_metrics_recorded_per_frame() {
        let mut renderer = VirtualRenderer::default();
        let objects = scattered(10);
        for _ in 0..3 {
            renderer.get_visible_set(&objects, &Viewport::default());
        }
        assert_eq!(renderer.recorder().len(), 3);
        assert_eq!(renderer.recorder_mut().drain_pending().len(), 3);
        assert_eq!(renderer.resolver().frame(), 3);
    }

    #[test]
    fn test_large_zoom_resets_metric_history() {
        let mut renderer = VirtualRenderer::default();
        let objects = scattered(10);
        renderer.get_visible_set(&objects, &Viewport::new(0.0, 0.0, 1000.0, 1000.0, 1.0));
        renderer.get_visible_set(&objects, &Viewport::new(0.0, 0.0, 1000.0, 1000.0, 1.05));
        assert_eq!(renderer.recorder().len(), 2);

        renderer.get_visible_set(&objects, &Viewport::new(0.0, 0.0, 1000.0, 1000.0, 0.5));
        assert_eq!(renderer.recorder().len(), 1);
        assert_eq!(renderer.resolver().stats().invalidations, 1);
        // Frames the monitor has not drained yet survive.
        assert_eq!(renderer.recorder_mut().drain_pending().len(), 3);
    }

    #[test]
    fn test_history_size_is_configurable() {
        let renderer = VirtualRenderer::with_history_size(VirtualRenderConfig::default(), 200).unwrap();
        assert_eq!(renderer.recorder().capacity(), 200);
        assert_eq!(VirtualRenderer::default().recorder().capacity(), DEFAULT_HISTORY_SIZE);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut renderer = VirtualRenderer::default();
        let mut bad = VirtualRenderConfig::default();
        bad.lod_thresholds.hidden = 0.5;
        assert!(renderer.set_config(bad).is_err());
        assert_eq!(renderer.config(), &VirtualRenderConfig::default());
    }
}
