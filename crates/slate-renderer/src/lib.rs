//! # Slate Renderer
//!
//! Viewport-driven virtual rendering for the canvas. Every frame the
//! [`VirtualRenderer`] queries the spatial index with the padded viewport and
//! classifies the candidates through a frame-bounded visibility cache. The
//! result is capped by priority and its [`RenderMetrics`] are recorded.
//!
//! Painting is not done here: the [`RenderFrame`] is handed to the canvas.

pub mod config;
pub mod metrics;
pub mod render_data;
pub mod viewport;
pub mod virtual_render;
pub mod visibility;

pub use config::{LodThresholds, VirtualRenderConfig};
pub use metrics::{MetricsRecorder, RenderMetrics};
pub use render_data::{RenderFrame, RenderItem};
pub use viewport::Viewport;
pub use virtual_render::VirtualRenderer;
pub use visibility::{LodLevel, ShapeVisibility, VisibilityResolver};
