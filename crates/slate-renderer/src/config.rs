use serde::{Deserialize, Serialize};
use slate_core::{ConfigError, SpatialConfig};

/// Scale cut-offs for level-of-detail. `hidden` must be below `simple`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodThresholds {
    /// Below this scale objects render simplified.
    pub simple: f64,
    /// Below this scale objects are not rendered at all.
    pub hidden: f64,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            simple: 0.3,
            hidden: 0.1,
        }
    }
}

/// Options driving one frame of virtual rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualRenderConfig {
    /// World units added around the viewport before culling.
    pub viewport_padding: f64,
    pub culling_enabled: bool,
    pub lod_enabled: bool,
    pub lod_thresholds: LodThresholds,
    pub max_shapes_per_frame: usize,
    pub batch_size: usize,
    /// Frame budget in milliseconds.
    pub frame_time_target: f64,
    pub enable_spatial_index: bool,
    /// Reserved; occlusion is never computed.
    pub enable_occlusion: bool,
    /// Evict stale visibility-cache entries once the cache is full.
    pub enable_memory_optimization: bool,
    pub spatial: SpatialConfig,
}

impl Default for VirtualRenderConfig {
    fn default() -> Self {
        Self {
            viewport_padding: 200.0,
            culling_enabled: true,
            lod_enabled: true,
            lod_thresholds: LodThresholds::default(),
            max_shapes_per_frame: 1000,
            batch_size: 50,
            frame_time_target: 16.67,
            enable_spatial_index: true,
            enable_occlusion: false,
            enable_memory_optimization: true,
            spatial: SpatialConfig::default(),
        }
    }
}

impl VirtualRenderConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.viewport_padding.is_finite() || self.viewport_padding < 0.0 {
            return Err(ConfigError::invalid(
                "viewportPadding",
                format!("must be a finite, non-negative number, got {}", self.viewport_padding),
            ));
        }

        let LodThresholds { simple, hidden } = self.lod_thresholds;
        if !simple.is_finite() || !hidden.is_finite() || hidden < 0.0 {
            return Err(ConfigError::invalid(
                "lodThresholds",
                format!("thresholds must be finite and non-negative, got simple={simple} hidden={hidden}"),
            ));
        }
        if hidden >= simple {
            return Err(ConfigError::LodThresholdOrder { hidden, simple });
        }

        if self.max_shapes_per_frame == 0 {
            return Err(ConfigError::invalid("maxShapesPerFrame", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batchSize", "must be at least 1"));
        }
        if !self.frame_time_target.is_finite() || self.frame_time_target <= 0.0 {
            return Err(ConfigError::invalid(
                "frameTimeTarget",
                format!("must be a positive number of milliseconds, got {}", self.frame_time_target),
            ));
        }
        if self.spatial.max_objects_per_node == 0 {
            return Err(ConfigError::invalid("spatial.maxObjectsPerNode", "must be at least 1"));
        }
        Ok(())
    }
}
