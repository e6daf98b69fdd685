use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use slate_core::{ConfigError, DrawableObject, Scene};
use slate_perf::monitor::ListenerId;
use slate_perf::{
    AdaptiveConfig, AdaptiveController, ModeSelection, MonitorConfig, OptimizationHints,
    PerformanceMode, PerformanceMonitor, PerformanceReport, PerformanceStats, PerformanceWarning,
    WarningListener,
};
use slate_renderer::{RenderFrame, Viewport, VirtualRenderConfig, VirtualRenderer};

/// Everything needed to stand up a [`RenderHost`], loadable from one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    /// Base render config; the active mode derives its config from this.
    pub render: VirtualRenderConfig,
    pub monitor: MonitorConfig,
    pub adaptive: AdaptiveConfig,
    pub monitor_interval_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            render: VirtualRenderConfig::default(),
            monitor: MonitorConfig::default(),
            adaptive: AdaptiveConfig::default(),
            monitor_interval_ms: 1000,
        }
    }
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        self.monitor.validate()?;
        self.adaptive.validate()?;
        if self.monitor_interval_ms == 0 {
            return Err(ConfigError::invalid("monitorIntervalMs", "must be at least 1"));
        }
        Ok(())
    }
}

/// Explicitly constructed owner of the whole pipeline.
///
/// The render tick is the only writer of frame metrics. The monitor tick
/// drains what the renderer queued, updates stats and lets the adaptive
/// controller pick the config the next render tick uses.
pub struct RenderHost {
    renderer: VirtualRenderer,
    monitor: PerformanceMonitor,
    controller: AdaptiveController,
    monitor_interval: Duration,
    last_monitor_tick: Option<Instant>,
    rendering: bool,
    monitoring: bool,
}

impl RenderHost {
    pub fn new(config: HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = AdaptiveController::new(config.adaptive, config.render)?;
        let renderer =
            VirtualRenderer::with_history_size(controller.active_config(), config.monitor.history_size)?;
        let monitor = PerformanceMonitor::new(config.monitor)?;
        log::info!(
            "Render host ready in {:?} mode ({:?} selection)",
            controller.mode(),
            controller.selection()
        );
        Ok(Self {
            renderer,
            monitor,
            controller,
            monitor_interval: Duration::from_millis(config.monitor_interval_ms),
            last_monitor_tick: None,
            rendering: true,
            monitoring: true,
        })
    }

    // ── Ticks ────────────────────────────────────────────────────────

    /// Render one frame of `objects`. `None` while rendering is stopped.
    pub fn render_tick(&mut self, objects: &[DrawableObject], viewport: &Viewport) -> Option<RenderFrame> {
        if !self.rendering {
            return None;
        }
        Some(self.renderer.get_visible_set(objects, viewport))
    }

    /// Render one frame of a [`Scene`]. `None` while rendering is stopped.
    pub fn render_scene_tick(&mut self, scene: &Scene, viewport: &Viewport) -> Option<RenderFrame> {
        if !self.rendering {
            return None;
        }
        Some(self.renderer.render_scene(scene, viewport))
    }

    /// Drain queued frame metrics into the monitor, check thresholds and
    /// re-evaluate the render mode. Does nothing while monitoring is stopped.
    pub fn monitor_tick(&mut self) -> Vec<PerformanceWarning> {
        if !self.monitoring {
            return Vec::new();
        }
        let frames = self.renderer.recorder_mut().drain_pending();
        let warnings = self.monitor.tick(frames);
        if let Some(config) = self.controller.evaluate(&self.monitor.stats()) {
            self.apply_render_config(config);
        }
        warnings
    }

    /// Run the monitor tick if its interval has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<PerformanceWarning>> {
        if !self.monitoring {
            return None;
        }
        let due = match self.last_monitor_tick {
            Some(last) => now.saturating_duration_since(last) >= self.monitor_interval,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_monitor_tick = Some(now);
        Some(self.monitor_tick())
    }

    pub fn start_rendering(&mut self) {
        self.rendering = true;
    }

    pub fn stop_rendering(&mut self) {
        self.rendering = false;
    }

    pub fn start_monitoring(&mut self) {
        self.monitoring = true;
        self.last_monitor_tick = None;
    }

    /// Stop the monitor tick. Rendering carries on; queued metrics are kept
    /// (up to the recorder's bound) for when monitoring resumes.
    pub fn stop_monitoring(&mut self) {
        self.monitoring = false;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn mode(&self) -> PerformanceMode {
        self.controller.mode()
    }

    /// Pin a mode, or hand control back to the auto rule.
    pub fn set_mode(&mut self, selection: ModeSelection) {
        if let Some(config) = self.controller.select(selection) {
            self.apply_render_config(config);
        }
    }

    /// Replace the base render config. Rejected configs leave everything as it was.
    pub fn set_render_config(&mut self, base: VirtualRenderConfig) -> Result<(), ConfigError> {
        let active = self.controller.set_base(base)?;
        self.renderer.set_config(active)
    }

    fn apply_render_config(&mut self, config: VirtualRenderConfig) {
        if let Err(e) = self.renderer.set_config(config) {
            log::error!("Failed to apply {:?} mode config: {}", self.controller.mode(), e);
        }
    }

    /// Call when objects were added, removed or moved outside of a [`Scene`].
    pub fn mark_objects_changed(&mut self) {
        self.renderer.mark_objects_changed();
    }

    // ── Monitoring surface ───────────────────────────────────────────

    pub fn stats(&self) -> PerformanceStats {
        self.monitor.stats()
    }

    pub fn hints(&self) -> OptimizationHints {
        self.monitor.generate_optimization_hints()
    }

    pub fn export_report(&self) -> PerformanceReport {
        self.monitor.export_report()
    }

    pub fn add_warning_listener(&mut self, listener: Box<dyn WarningListener>) -> ListenerId {
        self.monitor.add_listener(listener)
    }

    pub fn remove_warning_listener(&mut self, id: ListenerId) -> bool {
        self.monitor.remove_listener(id)
    }

    pub fn renderer(&self) -> &VirtualRenderer {
        &self.renderer
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Direct access for feeding externally measured metrics.
    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }

    /// Clear caches, index, queued metrics and monitor history. Mode and listeners stay.
    pub fn reset(&mut self) {
        self.renderer.reset();
        self.monitor.reset();
        self.last_monitor_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, spacing: f64) -> Vec<DrawableObject> {
        (0..n)
            .map(|i| {
                let x = (i % 50) as f64 * spacing;
                let y = (i / 50) as f64 * spacing;
                DrawableObject::from_corners(x, y, x + 10.0, y + 10.0)
            })
            .collect()
    }

    #[test]
    fn test_host_config_json() {
        let config = HostConfig::from_json(
            r#"{"render": {"viewportPadding": 50}, "adaptive": {"selection": "balanced"}, "monitorIntervalMs": 250}"#,
        )
        .unwrap();
        assert_eq!(config.render.viewport_padding, 50.0);
        assert_eq!(config.adaptive.selection, ModeSelection::Balanced);
        assert_eq!(config.monitor_interval_ms, 250);

        assert!(HostConfig::from_json(r#"{"monitorIntervalMs": 0}"#).is_err());
        assert!(HostConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_poll_respects_interval() {
        let mut host = RenderHost::new(HostConfig::default()).unwrap();
        let objects = grid(10, 20.0);
        let vp = Viewport::default();
        host.render_tick(&objects, &vp);

        let t0 = Instant::now();
        assert!(host.poll(t0).is_some());
        assert!(host.poll(t0 + Duration::from_millis(500)).is_none());
        assert!(host.poll(t0 + Duration::from_millis(1000)).is_some());
    }

    #[test]
    fn test_monitor_tick_drains_queue() {
        let mut host = RenderHost::new(HostConfig::default()).unwrap();
        let objects = grid(20, 20.0);
        let vp = Viewport::default();
        for _ in 0..5 {
            host.render_tick(&objects, &vp);
        }
        host.monitor_tick();
        assert_eq!(host.stats().frames_sampled, 5);
        assert_eq!(host.stats().total_shapes, 20);

        // Nothing new queued, so a second tick leaves the sample count alone.
        host.monitor_tick();
        assert_eq!(host.stats().frames_sampled, 5);
    }

    #[test]
    fn test_stopped_rendering_yields_nothing() {
        let mut host = RenderHost::new(HostConfig::default()).unwrap();
        host.stop_rendering();
        assert!(host.render_tick(&grid(5, 20.0), &Viewport::default()).is_none());
        host.start_rendering();
        assert!(host.render_tick(&grid(5, 20.0), &Viewport::default()).is_some());
    }

    #[test]
    fn test_set_mode_swaps_renderer_config() {
        let mut host = RenderHost::new(HostConfig::default()).unwrap();
        assert_eq!(host.mode(), PerformanceMode::Balanced);

        host.set_mode(ModeSelection::Compatibility);
        assert_eq!(host.mode(), PerformanceMode::Compatibility);
        assert!(!host.renderer().config().culling_enabled);

        host.set_mode(ModeSelection::High);
        assert_eq!(host.renderer().config().batch_size, 25);
    }

    #[test]
    fn test_recorder_follows_monitor_history_size() {
        let mut config = HostConfig::default();
        config.monitor.history_size = 100;
        let mut host = RenderHost::new(config).unwrap();
        assert_eq!(host.renderer().recorder().capacity(), 100);

        host.stop_monitoring();
        let objects = grid(5, 20.0);
        for _ in 0..300 {
            host.render_tick(&objects, &Viewport::default());
        }
        // A 60-frame recorder would have capped the queue at 240.
        assert_eq!(host.renderer().recorder().pending_len(), 300);
    }

    #[test]
    fn test_invalid_base_config_is_rejected() {
        let mut host = RenderHost::new(HostConfig::default()).unwrap();
        let bad = VirtualRenderConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(host.set_render_config(bad).is_err());
        assert_eq!(host.renderer().config().batch_size, 50);
    }
}
