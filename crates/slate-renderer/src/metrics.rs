use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of frames kept in the rolling history.
pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Measurements for a single rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMetrics {
    /// Time spent resolving the visible set, in milliseconds.
    pub frame_time: f64,
    pub shapes_rendered: usize,
    pub shapes_culled: usize,
    /// Objects dropped for malformed bounds (also counted as culled).
    pub shapes_skipped: usize,
    pub draw_calls: usize,
    /// Estimated bytes held by the index, cache and object snapshot.
    pub memory_usage: usize,
    pub viewport_queries: usize,
    /// Milliseconds since the Unix epoch.
    pub timestamp: f64,
}

impl RenderMetrics {
    pub fn total_shapes(&self) -> usize {
        self.shapes_rendered + self.shapes_culled
    }
}

/// Rolling per-frame history written by the render tick.
///
/// Besides the history, every recorded frame is queued for the monitor tick,
/// which drains the queue on its own schedule. If the monitor stops, the queue
/// is bounded and drops its oldest frames.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    history: VecDeque<RenderMetrics>,
    pending: VecDeque<RenderMetrics>,
    capacity: usize,
    frames_recorded: u64,
}

impl MetricsRecorder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            pending: VecDeque::new(),
            capacity,
            frames_recorded: 0,
        }
    }

    pub fn record(&mut self, metrics: RenderMetrics) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(metrics);

        if self.pending.len() == self.pending_limit() {
            self.pending.pop_front();
        }
        self.pending.push_back(metrics);
        self.frames_recorded += 1;
    }

    fn pending_limit(&self) -> usize {
        self.capacity * 4
    }

    /// Take every frame recorded since the last drain, oldest first.
    pub fn drain_pending(&mut self) -> Vec<RenderMetrics> {
        self.pending.drain(..).collect()
    }

    pub fn latest(&self) -> Option<&RenderMetrics> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &RenderMetrics> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// Mean frame time over the history, 0 when empty.
    pub fn average_frame_time(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|m| m.frame_time).sum::<f64>() / self.history.len() as f64
    }

    /// Frames kept in the history. The pending queue holds four times this.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames queued for the monitor and not yet drained.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the rolling history but keep frames the monitor has not seen yet.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.pending.clear();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
