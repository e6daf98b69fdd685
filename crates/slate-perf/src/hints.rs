use serde::{Deserialize, Serialize};

use crate::stats::PerformanceStats;

const MB: f64 = 1024.0 * 1024.0;

/// Recommendations derived from the current [`PerformanceStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationHints {
    pub should_use_lod: bool,
    pub should_cull_aggressively: bool,
    pub should_batch_render: bool,
    pub should_use_simple_shapes: bool,
    pub recommended_batch_size: usize,
    /// Heuristic estimate in `[0, 100]`.
    pub estimated_performance_gain: f64,
}

impl OptimizationHints {
    pub fn from_stats(stats: &PerformanceStats) -> Self {
        let slow = stats.fps < 30.0;
        Self {
            should_use_lod: stats.fps < 45.0 || stats.total_shapes > 500,
            should_cull_aggressively: stats.total_shapes > 0 && stats.culling_efficiency < 50.0,
            should_batch_render: slow,
            should_use_simple_shapes: slow || stats.memory_usage > 100.0 * MB,
            recommended_batch_size: if slow { 25 } else { 50 },
            estimated_performance_gain: estimated_gain(stats),
        }
    }
}

/// Weighted sum of the culling gap, memory gap and shape-count pressure.
fn estimated_gain(stats: &PerformanceStats) -> f64 {
    let culling_gap = if stats.total_shapes > 0 {
        (100.0 - stats.culling_efficiency).max(0.0)
    } else {
        0.0
    };
    let memory_gap = (100.0 - stats.memory_efficiency).max(0.0);
    let shape_pressure = (stats.total_shapes as f64 / 1000.0).min(1.0) * 100.0;

    (culling_gap * 0.4 + memory_gap * 0.3 + shape_pressure * 0.3).clamp(0.0, 100.0)
}
