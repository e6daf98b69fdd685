use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slate_core::time::timestamp_ms;

use crate::hints::OptimizationHints;
use crate::monitor::PerformanceMonitor;
use crate::stats::PerformanceStats;
use crate::trend::Trend;

/// Frame rate treated as a perfect score.
const TARGET_FPS: f64 = 60.0;

/// Serializable snapshot of everything the monitor knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub timestamp: f64,
    pub stats: PerformanceStats,
    pub metrics: BTreeMap<String, Vec<f64>>,
    pub trends: BTreeMap<String, Trend>,
    pub hints: OptimizationHints,
    /// 0 to 100; see [`performance_score`].
    pub score: u32,
}

impl PerformanceReport {
    pub fn new(monitor: &PerformanceMonitor) -> Self {
        let stats = monitor.stats();
        let histories = monitor.histories();
        Self {
            timestamp: timestamp_ms(),
            stats,
            metrics: histories
                .iter()
                .map(|(name, values)| (name.clone(), values.iter().copied().collect()))
                .collect(),
            trends: histories
                .keys()
                .map(|name| (name.clone(), monitor.metric_trend(name)))
                .collect(),
            hints: monitor.generate_optimization_hints(),
            score: performance_score(&stats),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Weighted score: fps 40%, culling efficiency 30%, memory efficiency 30%.
///
/// Each component is normalized to `[0, 1]` before weighting.
pub fn performance_score(stats: &PerformanceStats) -> u32 {
    let fps = (stats.fps / TARGET_FPS).clamp(0.0, 1.0);
    let culling = (stats.culling_efficiency / 100.0).clamp(0.0, 1.0);
    let memory = (stats.memory_efficiency / 100.0).clamp(0.0, 1.0);
    ((fps * 0.4 + culling * 0.3 + memory * 0.3) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::metric;

    #[test]
    fn test_score_bounds() {
        let perfect = PerformanceStats {
            fps: 120.0,
            culling_efficiency: 100.0,
            memory_efficiency: 100.0,
            ..Default::default()
        };
        assert_eq!(performance_score(&perfect), 100);

        let idle = PerformanceStats {
            memory_efficiency: 0.0,
            ..Default::default()
        };
        assert_eq!(performance_score(&idle), 0);
    }

    #[test]
    fn test_score_weights() {
        let stats = PerformanceStats {
            fps: 30.0,
            culling_efficiency: 50.0,
            memory_efficiency: 100.0,
            ..Default::default()
        };
        // 0.5 * 40 + 0.5 * 30 + 1.0 * 30
        assert_eq!(performance_score(&stats), 65);
    }

    #[test]
    fn test_report_contents() {
        let mut monitor = PerformanceMonitor::default();
        for v in [10.0, 10.0, 10.0, 10.0, 10.0, 60.0, 60.0, 60.0, 60.0, 60.0] {
            monitor.record_metric(metric::FPS, v);
        }
        monitor.record_metric(metric::SHAPES_RENDERED, 20.0);
        monitor.record_metric(metric::SHAPES_CULLED, 80.0);

        let report = monitor.export_report();
        assert_eq!(report.metrics[metric::FPS].len(), 10);
        assert_eq!(report.trends[metric::FPS], Trend::Increasing);
        assert_eq!(report.trends[metric::SHAPES_CULLED], Trend::Stable);
        assert_eq!(report.stats.culling_efficiency, 80.0);
        assert_eq!(report.score, performance_score(&report.stats));

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trends"]["fps"], "increasing");
        assert!(value["hints"]["shouldUseLod"].is_boolean());
        assert!(value["stats"]["cullingEfficiency"].is_number());
    }
}
