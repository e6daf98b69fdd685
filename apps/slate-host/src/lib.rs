//! # Slate Host
//!
//! Owns one renderer, one performance monitor and one adaptive controller,
//! and drives them with two independently stoppable ticks: a render tick per
//! frame and a slower monitor tick.

pub mod host;
pub mod logging;

pub use host::{HostConfig, RenderHost};
pub use logging::{init_logging, LoggingConfig};
