//! # Slate Perf
//!
//! Turns per-frame [`RenderMetrics`](slate_renderer::RenderMetrics) into
//! rolling statistics, trends, threshold warnings and optimization hints, and
//! closes the loop by picking the render mode the next frames run with.
//!
//! The monitor is meant to run on a slower tick (about once a second) than
//! the render loop; it only consumes metrics the render tick has queued.

pub mod adaptive;
pub mod error;
pub mod hints;
pub mod monitor;
pub mod report;
pub mod stats;
pub mod trend;
pub mod warning;

pub use adaptive::{AdaptiveConfig, AdaptiveController, ModeSelection, PerformanceMode};
pub use error::ListenerError;
pub use hints::OptimizationHints;
pub use monitor::{metric, MonitorConfig, PerformanceMonitor};
pub use report::PerformanceReport;
pub use stats::PerformanceStats;
pub use trend::Trend;
pub use warning::{PerformanceWarning, WarningKind, WarningLevel, WarningListener};
