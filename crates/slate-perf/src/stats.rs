use serde::{Deserialize, Serialize};

/// Rolling aggregate of recent frames.
///
/// Every field has a neutral value before any samples arrive: zero for
/// rates and counts, 100% for memory efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub fps: f64,
    pub avg_frame_time: f64,
    pub min_frame_time: f64,
    pub max_frame_time: f64,
    pub total_shapes: usize,
    pub visible_shapes: usize,
    /// Percentage of objects culled in the latest frame, in `[0, 100]`.
    pub culling_efficiency: f64,
    /// Baseline memory as a percentage of current memory, capped at 100.
    pub memory_efficiency: f64,
    /// Latest memory estimate in bytes.
    pub memory_usage: f64,
    /// Frame-time samples currently in the window.
    pub frames_sampled: usize,
    /// Milliseconds since the Unix epoch; 0 before the first sample.
    pub last_update: f64,
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self {
            fps: 0.0,
            avg_frame_time: 0.0,
            min_frame_time: 0.0,
            max_frame_time: 0.0,
            total_shapes: 0,
            visible_shapes: 0,
            culling_efficiency: 0.0,
            memory_efficiency: 100.0,
            memory_usage: 0.0,
            frames_sampled: 0,
            last_update: 0.0,
        }
    }
}

impl PerformanceStats {
    pub fn memory_usage_mb(&self) -> f64 {
        self.memory_usage / (1024.0 * 1024.0)
    }
}

/// `culled / (rendered + culled) * 100`, or 0 when nothing was considered.
pub fn culling_efficiency(rendered: f64, culled: f64) -> f64 {
    let total = rendered + culled;
    if total <= 0.0 {
        return 0.0;
    }
    (culled / total * 100.0).clamp(0.0, 100.0)
}

/// `baseline / current * 100`, capped at 100; 100 when nothing is in use.
pub fn memory_efficiency(baseline: f64, current: f64) -> f64 {
    if current <= 0.0 {
        return 100.0;
    }
    (baseline / current * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_culling_efficiency() {
        assert_eq!(culling_efficiency(0.0, 0.0), 0.0);
        assert_eq!(culling_efficiency(25.0, 75.0), 75.0);
        assert_eq!(culling_efficiency(0.0, 10.0), 100.0);
        assert_eq!(culling_efficiency(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_memory_efficiency() {
        assert_eq!(memory_efficiency(50.0, 0.0), 100.0);
        assert_eq!(memory_efficiency(50.0, 25.0), 100.0);
        assert_eq!(memory_efficiency(50.0, 100.0), 50.0);
    }
}
