//! Rolling metric histories, derived statistics and threshold warnings.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use slate_core::time::timestamp_ms;
use slate_core::ConfigError;
use slate_renderer::RenderMetrics;

use crate::hints::OptimizationHints;
use crate::report::PerformanceReport;
use crate::stats::{culling_efficiency, memory_efficiency, PerformanceStats};
use crate::trend::Trend;
use crate::warning::{PerformanceWarning, Tier, WarningKind, WarningLevel, WarningListener};

/// Well-known metric names.
pub mod metric {
    pub const FRAME_TIME: &str = "frameTime";
    pub const FPS: &str = "fps";
    pub const SHAPES_RENDERED: &str = "shapesRendered";
    pub const SHAPES_CULLED: &str = "shapesCulled";
    pub const DRAW_CALLS: &str = "drawCalls";
    pub const MEMORY_USAGE: &str = "memoryUsage";
    pub const VIEWPORT_QUERIES: &str = "viewportQueries";
}

/// Threshold tiers for the three watched quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorThresholds {
    /// Frames per second; lower is worse.
    pub fps: Tier,
    /// Average frame time in milliseconds; higher is worse.
    pub frame_time: Tier,
    /// Memory in megabytes; higher is worse.
    pub memory_mb: Tier,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            fps: Tier {
                warning: 45.0,
                critical: 30.0,
            },
            frame_time: Tier {
                warning: 22.0,
                critical: 33.0,
            },
            memory_mb: Tier {
                warning: 100.0,
                critical: 200.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Samples kept per metric.
    pub history_size: usize,
    pub thresholds: MonitorThresholds,
    /// Memory footprint considered fully efficient, in bytes.
    pub memory_baseline_bytes: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_size: 60,
            thresholds: MonitorThresholds::default(),
            memory_baseline_bytes: 50.0 * 1024.0 * 1024.0,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::invalid("historySize", "must be at least 1"));
        }
        if !self.memory_baseline_bytes.is_finite() || self.memory_baseline_bytes <= 0.0 {
            return Err(ConfigError::invalid(
                "memoryBaselineBytes",
                format!("must be positive, got {}", self.memory_baseline_bytes),
            ));
        }
        let t = &self.thresholds;
        if t.fps.critical > t.fps.warning {
            return Err(ConfigError::invalid("thresholds.fps", "critical must not exceed warning"));
        }
        if t.frame_time.critical < t.frame_time.warning || t.memory_mb.critical < t.memory_mb.warning {
            return Err(ConfigError::invalid(
                "thresholds",
                "critical must not be below warning for frame time and memory",
            ));
        }
        Ok(())
    }
}

/// Handle returned by [`PerformanceMonitor::add_listener`].
pub type ListenerId = usize;

/// Aggregates frame metrics into [`PerformanceStats`] and raises warnings.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    histories: HashMap<String, VecDeque<f64>>,
    stats: PerformanceStats,
    listeners: Vec<(ListenerId, Box<dyn WarningListener>)>,
    next_listener: ListenerId,
}

impl PerformanceMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            histories: HashMap::new(),
            stats: PerformanceStats::default(),
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    // ── Recording ────────────────────────────────────────────────────

    /// Append a sample and refresh whatever statistics derive from it.
    pub fn record_metric(&mut self, name: &str, value: f64) {
        if !value.is_finite() {
            log::warn!("Ignoring non-finite sample {} for metric '{}'", value, name);
            return;
        }
        self.push(name, value);

        match name {
            metric::FRAME_TIME => {
                if value > 0.0 {
                    self.push(metric::FPS, 1000.0 / value);
                }
                self.refresh_frame_stats();
            }
            metric::FPS => self.stats.fps = value,
            metric::SHAPES_RENDERED | metric::SHAPES_CULLED => self.refresh_shape_stats(),
            metric::MEMORY_USAGE => {
                self.stats.memory_usage = value;
                self.stats.memory_efficiency =
                    memory_efficiency(self.config.memory_baseline_bytes, value);
            }
            _ => {}
        }
        self.stats.last_update = timestamp_ms();
    }

    /// Record every field of one frame's metrics.
    pub fn record_frame(&mut self, frame: &RenderMetrics) {
        self.record_metric(metric::FRAME_TIME, frame.frame_time);
        self.record_metric(metric::SHAPES_RENDERED, frame.shapes_rendered as f64);
        self.record_metric(metric::SHAPES_CULLED, frame.shapes_culled as f64);
        self.record_metric(metric::DRAW_CALLS, frame.draw_calls as f64);
        self.record_metric(metric::MEMORY_USAGE, frame.memory_usage as f64);
        self.record_metric(metric::VIEWPORT_QUERIES, frame.viewport_queries as f64);
    }

    fn push(&mut self, name: &str, value: f64) {
        let capacity = self.config.history_size;
        let history = self.histories.entry(name.to_string()).or_default();
        if history.len() == capacity {
            history.pop_front();
        }
        history.push_back(value);
    }

    fn refresh_frame_stats(&mut self) {
        let Some(frames) = self.histories.get(metric::FRAME_TIME).filter(|h| !h.is_empty()) else {
            return;
        };
        let avg = frames.iter().sum::<f64>() / frames.len() as f64;
        self.stats.avg_frame_time = avg;
        self.stats.min_frame_time = frames.iter().copied().fold(f64::INFINITY, f64::min);
        self.stats.max_frame_time = frames.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.stats.frames_sampled = frames.len();
        self.stats.fps = if avg > 0.0 { 1000.0 / avg } else { 0.0 };
    }

    fn refresh_shape_stats(&mut self) {
        let rendered = self.latest(metric::SHAPES_RENDERED).unwrap_or(0.0);
        let culled = self.latest(metric::SHAPES_CULLED).unwrap_or(0.0);
        self.stats.visible_shapes = rendered as usize;
        self.stats.total_shapes = (rendered + culled) as usize;
        self.stats.culling_efficiency = culling_efficiency(rendered, culled);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn stats(&self) -> PerformanceStats {
        self.stats
    }

    pub fn history(&self, name: &str) -> Option<&VecDeque<f64>> {
        self.histories.get(name)
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.histories.get(name).and_then(|h| h.back().copied())
    }

    /// Mean of the last `window` samples (all samples when `None`); 0 with no data.
    pub fn average_metric(&self, name: &str, window: Option<usize>) -> f64 {
        let Some(history) = self.histories.get(name) else {
            return 0.0;
        };
        let take = window.unwrap_or(history.len()).min(history.len());
        if take == 0 {
            return 0.0;
        }
        history.iter().rev().take(take).sum::<f64>() / take as f64
    }

    pub fn metric_trend(&self, name: &str) -> Trend {
        self.histories.get(name).map_or(Trend::Stable, |h| Trend::of(h))
    }

    pub fn generate_optimization_hints(&self) -> OptimizationHints {
        OptimizationHints::from_stats(&self.stats)
    }

    pub fn export_report(&self) -> PerformanceReport {
        PerformanceReport::new(self)
    }

    pub(crate) fn histories(&self) -> &HashMap<String, VecDeque<f64>> {
        &self.histories
    }

    // ── Warnings ─────────────────────────────────────────────────────

    pub fn add_listener(&mut self, listener: Box<dyn WarningListener>) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Evaluate the threshold tiers and notify listeners of anything not `good`.
    pub fn check_thresholds(&mut self) -> Vec<PerformanceWarning> {
        let warnings = self.current_warnings();
        for warning in &warnings {
            log::warn!("{}", warning.message);
            self.emit(warning);
        }
        warnings
    }

    fn current_warnings(&self) -> Vec<PerformanceWarning> {
        let thresholds = &self.config.thresholds;
        let stats = self.stats;
        let mut checks = Vec::new();

        if stats.frames_sampled > 0 || self.histories.contains_key(metric::FPS) {
            checks.push((
                WarningKind::Fps,
                thresholds.fps.classify_low(stats.fps),
                format!("{:.1} fps", stats.fps),
            ));
        }
        if stats.frames_sampled > 0 {
            checks.push((
                WarningKind::FrameTime,
                thresholds.frame_time.classify_high(stats.avg_frame_time),
                format!("{:.2} ms average frame time", stats.avg_frame_time),
            ));
        }
        if self.histories.contains_key(metric::MEMORY_USAGE) {
            checks.push((
                WarningKind::Memory,
                thresholds.memory_mb.classify_high(stats.memory_usage_mb()),
                format!("{:.1} MB estimated memory", stats.memory_usage_mb()),
            ));
        }

        checks
            .into_iter()
            .filter(|(_, level, _)| *level != WarningLevel::Good)
            .map(|(kind, level, detail)| PerformanceWarning {
                level,
                kind,
                message: format!("Performance {:?} ({:?}): {}", level, kind, detail),
                stats,
            })
            .collect()
    }

    fn emit(&mut self, warning: &PerformanceWarning) {
        for (id, listener) in self.listeners.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| listener.on_warning(warning))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Warning listener {} failed: {}", id, e),
                Err(_) => log::error!("Warning listener {} panicked", id),
            }
        }
    }

    /// One monitor tick: ingest queued frames, then evaluate thresholds.
    pub fn tick<I>(&mut self, frames: I) -> Vec<PerformanceWarning>
    where
        I: IntoIterator<Item = RenderMetrics>,
    {
        let mut ingested = 0;
        for frame in frames {
            self.record_frame(&frame);
            ingested += 1;
        }
        log::debug!(
            "Monitor tick: {} frames ingested, {:.1} fps, {:.0}% culled",
            ingested,
            self.stats.fps,
            self.stats.culling_efficiency
        );
        self.check_thresholds()
    }

    /// Drop every history and return stats to their neutral values. Listeners stay.
    pub fn reset(&mut self) {
        self.histories.clear();
        self.stats = PerformanceStats::default();
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self {
            config: MonitorConfig::default(),
            histories: HashMap::new(),
            stats: PerformanceStats::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .field("metrics", &self.histories.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
