use serde::{Deserialize, Serialize};

use crate::error::ListenerError;
use crate::stats::PerformanceStats;

/// Health tier of a monitored quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Good,
    Warning,
    Critical,
}

/// Which quantity crossed a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    Fps,
    FrameTime,
    Memory,
}

/// Warning / critical cut-offs for one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub warning: f64,
    pub critical: f64,
}

impl Tier {
    /// Classify a quantity where lower values are worse (fps).
    pub fn classify_low(&self, value: f64) -> WarningLevel {
        if value < self.critical {
            WarningLevel::Critical
        } else if value < self.warning {
            WarningLevel::Warning
        } else {
            WarningLevel::Good
        }
    }

    /// Classify a quantity where higher values are worse (frame time, memory).
    pub fn classify_high(&self, value: f64) -> WarningLevel {
        if value > self.critical {
            WarningLevel::Critical
        } else if value > self.warning {
            WarningLevel::Warning
        } else {
            WarningLevel::Good
        }
    }
}

/// Emitted when a monitored quantity is in the warning or critical tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceWarning {
    pub level: WarningLevel,
    pub kind: WarningKind,
    pub message: String,
    pub stats: PerformanceStats,
}

/// Subscriber for performance warnings.
///
/// Closures of the form `FnMut(&PerformanceWarning) -> Result<(), ListenerError>`
/// implement this trait.
pub trait WarningListener {
    fn on_warning(&mut self, warning: &PerformanceWarning) -> Result<(), ListenerError>;
}

impl<F> WarningListener for F
where
    F: FnMut(&PerformanceWarning) -> Result<(), ListenerError>,
{
    fn on_warning(&mut self, warning: &PerformanceWarning) -> Result<(), ListenerError> {
        self(warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_low() {
        let tier = Tier {
            warning: 45.0,
            critical: 30.0,
        };
        assert_eq!(tier.classify_low(60.0), WarningLevel::Good);
        assert_eq!(tier.classify_low(45.0), WarningLevel::Good);
        assert_eq!(tier.classify_low(40.0), WarningLevel::Warning);
        assert_eq!(tier.classify_low(10.0), WarningLevel::Critical);
    }

    #[test]
    fn test_classify_high() {
        let tier = Tier {
            warning: 22.0,
            critical: 33.0,
        };
        assert_eq!(tier.classify_high(16.0), WarningLevel::Good);
        assert_eq!(tier.classify_high(25.0), WarningLevel::Warning);
        assert_eq!(tier.classify_high(50.0), WarningLevel::Critical);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(WarningLevel::Critical > WarningLevel::Warning);
        assert!(WarningLevel::Warning > WarningLevel::Good);
    }
}
