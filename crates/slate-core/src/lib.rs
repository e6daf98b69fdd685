//! # Slate Core
//!
//! Geometry primitives and the id-indexed drawable-object arena, plus the
//! loose-quadtree spatial index used for viewport culling.
//!
//! This crate has no notion of frames or timing; see `slate-renderer` for the
//! per-frame pipeline built on top of it.

pub mod error;
pub mod geometry;
pub mod scene;
pub mod spatial;
pub mod time;

pub use error::ConfigError;
pub use geometry::{BoundingBox, Bounds, Point};
pub use scene::{DrawableObject, ObjectId, Scene};
pub use spatial::{SpatialConfig, SpatialIndex};
