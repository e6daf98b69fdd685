//! Closed-loop selection of the active render configuration.
//!
//! A mode is nothing more than a [`VirtualRenderConfig`] derived from the base
//! config. Switching modes swaps the config the renderer uses on its next
//! frame; there is no separate render path.

use serde::{Deserialize, Serialize};
use slate_core::ConfigError;
use slate_renderer::{LodThresholds, VirtualRenderConfig};

use crate::stats::PerformanceStats;

/// Discrete rendering configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    /// Aggressive optimization for heavy canvases or slow frames.
    High,
    Balanced,
    /// Culling, LOD and indexing off; every object drawn in full.
    Compatibility,
}

impl PerformanceMode {
    /// Derive this mode's config from `base`, keeping the base frame budget.
    pub fn apply(&self, base: &VirtualRenderConfig) -> VirtualRenderConfig {
        match self {
            PerformanceMode::High => VirtualRenderConfig {
                viewport_padding: 100.0,
                culling_enabled: true,
                lod_enabled: true,
                lod_thresholds: LodThresholds {
                    simple: 0.5,
                    hidden: 0.2,
                },
                max_shapes_per_frame: base.max_shapes_per_frame.min(500),
                batch_size: 25,
                enable_spatial_index: true,
                enable_occlusion: true,
                enable_memory_optimization: true,
                ..base.clone()
            },
            PerformanceMode::Balanced => base.clone(),
            PerformanceMode::Compatibility => VirtualRenderConfig {
                culling_enabled: false,
                lod_enabled: false,
                enable_spatial_index: false,
                enable_occlusion: false,
                max_shapes_per_frame: usize::MAX,
                ..base.clone()
            },
        }
    }
}

/// What the caller asked for: a fixed mode, or automatic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    #[default]
    Auto,
    High,
    Balanced,
    Compatibility,
}

impl ModeSelection {
    pub fn fixed(&self) -> Option<PerformanceMode> {
        match self {
            ModeSelection::Auto => None,
            ModeSelection::High => Some(PerformanceMode::High),
            ModeSelection::Balanced => Some(PerformanceMode::Balanced),
            ModeSelection::Compatibility => Some(PerformanceMode::Compatibility),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdaptiveConfig {
    pub selection: ModeSelection,
    /// Evaluations that must pass after a switch before auto may switch again.
    pub min_dwell_ticks: u32,
    /// Fps margin that shifts each cut-off in favor of the current mode.
    pub hysteresis_fps: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            selection: ModeSelection::Auto,
            min_dwell_ticks: 3,
            hysteresis_fps: 0.0,
        }
    }
}

impl AdaptiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.hysteresis_fps.is_finite() || self.hysteresis_fps < 0.0 {
            return Err(ConfigError::invalid(
                "hysteresisFps",
                format!("must be a non-negative number, got {}", self.hysteresis_fps),
            ));
        }
        Ok(())
    }
}

/// Auto-mode decision for the given stats, ignoring dwell time.
///
/// With a zero margin: fps < 30 or more than 1000 shapes selects `High`;
/// fps < 45 or more than 500 shapes selects `Balanced`; fps > 55 with fewer
/// than 200 shapes selects `Compatibility`; otherwise the current mode holds.
pub fn auto_mode(stats: &PerformanceStats, current: PerformanceMode, margin: f64) -> PerformanceMode {
    let (high_cut, balanced_cut, compat_cut) = match current {
        PerformanceMode::High => (30.0 + margin, 45.0, 55.0 + margin),
        PerformanceMode::Balanced => (30.0 - margin, 45.0 + margin, 55.0 + margin),
        PerformanceMode::Compatibility => (30.0 - margin, 45.0 - margin, 55.0),
    };

    if stats.fps < high_cut || stats.total_shapes > 1000 {
        PerformanceMode::High
    } else if stats.fps < balanced_cut || stats.total_shapes > 500 {
        PerformanceMode::Balanced
    } else if stats.fps > compat_cut && stats.total_shapes < 200 {
        PerformanceMode::Compatibility
    } else {
        current
    }
}

/// Chooses the active mode and hands back the config to apply.
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    config: AdaptiveConfig,
    base: VirtualRenderConfig,
    mode: PerformanceMode,
    ticks_since_switch: u32,
    switches: u64,
}

impl AdaptiveController {
    pub fn new(config: AdaptiveConfig, base: VirtualRenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        base.validate()?;
        let mode = config.selection.fixed().unwrap_or(PerformanceMode::Balanced);
        Ok(Self {
            config,
            base,
            mode,
            ticks_since_switch: 0,
            switches: 0,
        })
    }

    pub fn mode(&self) -> PerformanceMode {
        self.mode
    }

    pub fn selection(&self) -> ModeSelection {
        self.config.selection
    }

    pub fn is_auto(&self) -> bool {
        self.config.selection == ModeSelection::Auto
    }

    /// Number of mode changes since construction.
    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// Config for the current mode.
    pub fn active_config(&self) -> VirtualRenderConfig {
        self.mode.apply(&self.base)
    }

    /// Replace the base config every mode derives from.
    pub fn set_base(&mut self, base: VirtualRenderConfig) -> Result<VirtualRenderConfig, ConfigError> {
        base.validate()?;
        self.base = base;
        Ok(self.active_config())
    }

    /// Switch selection. A fixed mode applies immediately; `Auto` keeps the
    /// current mode until the next evaluation, which may switch without dwell.
    pub fn select(&mut self, selection: ModeSelection) -> Option<VirtualRenderConfig> {
        self.config.selection = selection;
        match selection.fixed() {
            Some(mode) if mode != self.mode => Some(self.switch_to(mode)),
            Some(_) => None,
            None => {
                self.ticks_since_switch = self.config.min_dwell_ticks;
                None
            }
        }
    }

    /// Run the auto rule against fresh stats. Returns the new config when the
    /// mode changed.
    pub fn evaluate(&mut self, stats: &PerformanceStats) -> Option<VirtualRenderConfig> {
        if !self.is_auto() || stats.frames_sampled == 0 {
            return None;
        }
        self.ticks_since_switch = self.ticks_since_switch.saturating_add(1);

        let target = auto_mode(stats, self.mode, self.config.hysteresis_fps);
        if target == self.mode {
            return None;
        }
        if self.switches > 0 && self.ticks_since_switch < self.config.min_dwell_ticks {
            log::debug!(
                "Holding {:?} (wanted {:?}): {} of {} dwell ticks",
                self.mode,
                target,
                self.ticks_since_switch,
                self.config.min_dwell_ticks
            );
            return None;
        }
        Some(self.switch_to(target))
    }

    fn switch_to(&mut self, mode: PerformanceMode) -> VirtualRenderConfig {
        log::info!("Render mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.ticks_since_switch = 0;
        self.switches += 1;
        self.active_config()
    }
}

impl Default for AdaptiveController {
    fn default() -> Self {
        Self {
            config: AdaptiveConfig::default(),
            base: VirtualRenderConfig::default(),
            mode: PerformanceMode::Balanced,
            ticks_since_switch: 0,
            switches: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(fps: f64, total_shapes: usize) -> PerformanceStats {
        PerformanceStats {
            fps,
            total_shapes,
            frames_sampled: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_auto_rule() {
        use PerformanceMode::*;
        assert_eq!(auto_mode(&stats(20.0, 100), Balanced, 0.0), High);
        assert_eq!(auto_mode(&stats(60.0, 1500), Balanced, 0.0), High);
        assert_eq!(auto_mode(&stats(40.0, 100), High, 0.0), Balanced);
        assert_eq!(auto_mode(&stats(60.0, 600), Compatibility, 0.0), Balanced);
        assert_eq!(auto_mode(&stats(60.0, 100), Balanced, 0.0), Compatibility);
        // Between 45 and 55 fps the current mode holds.
        assert_eq!(auto_mode(&stats(50.0, 100), High, 0.0), High);
        assert_eq!(auto_mode(&stats(50.0, 100), Compatibility, 0.0), Compatibility);
        assert_eq!(auto_mode(&stats(60.0, 300), Balanced, 0.0), Balanced);
    }

    #[test]
    fn test_hysteresis_margin_favors_current_mode() {
        use PerformanceMode::*;
        assert_eq!(auto_mode(&stats(44.0, 100), Compatibility, 0.0), Balanced);
        assert_eq!(auto_mode(&stats(44.0, 100), Compatibility, 2.0), Compatibility);
        assert_eq!(auto_mode(&stats(31.0, 100), High, 2.0), High);
        assert_eq!(auto_mode(&stats(29.0, 100), Balanced, 2.0), Balanced);
    }

    #[test]
    fn test_mode_configs() {
        let base = VirtualRenderConfig::default();
        let high = PerformanceMode::High.apply(&base);
        assert!(high.enable_occlusion);
        assert_eq!(high.batch_size, 25);
        assert!(high.validate().is_ok());

        assert_eq!(PerformanceMode::Balanced.apply(&base), base);

        let compat = PerformanceMode::Compatibility.apply(&base);
        assert!(!compat.culling_enabled);
        assert!(!compat.lod_enabled);
        assert!(!compat.enable_spatial_index);
        assert!(compat.validate().is_ok());
    }

    #[test]
    fn test_auto_switches_and_dwells() {
        let mut controller = AdaptiveController::default();
        assert_eq!(controller.mode(), PerformanceMode::Balanced);

        let applied = controller.evaluate(&stats(20.0, 100)).unwrap();
        assert_eq!(controller.mode(), PerformanceMode::High);
        assert_eq!(applied.batch_size, 25);

        // Recovered immediately, but the dwell keeps High for three ticks.
        assert!(controller.evaluate(&stats(60.0, 100)).is_none());
        assert!(controller.evaluate(&stats(60.0, 100)).is_none());
        assert!(controller.evaluate(&stats(60.0, 100)).is_some());
        assert_eq!(controller.mode(), PerformanceMode::Compatibility);
        assert_eq!(controller.switches(), 2);
    }

    #[test]
    fn test_fixed_selection_ignores_stats() {
        let mut controller = AdaptiveController::default();
        let config = controller.select(ModeSelection::Compatibility).unwrap();
        assert!(!config.culling_enabled);
        assert!(controller.evaluate(&stats(5.0, 5000)).is_none());
        assert_eq!(controller.mode(), PerformanceMode::Compatibility);

        assert!(controller.select(ModeSelection::Auto).is_none());
        assert!(controller.evaluate(&stats(5.0, 5000)).is_some());
    }

    #[test]
    fn test_no_samples_no_decision() {
        let mut controller = AdaptiveController::default();
        assert!(controller.evaluate(&PerformanceStats::default()).is_none());
    }

    #[test]
    fn test_config_json() {
        let config: AdaptiveConfig =
            serde_json::from_str(r#"{"selection": "high", "hysteresisFps": 3}"#).unwrap();
        assert_eq!(config.selection, ModeSelection::High);
        assert_eq!(config.min_dwell_ticks, 3);
        assert!(AdaptiveController::new(config, VirtualRenderConfig::default()).is_ok());

        let bad = AdaptiveConfig {
            hysteresis_fps: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
