use serde::{Deserialize, Serialize};

/// Samples needed before a trend is reported.
pub const MIN_TREND_SAMPLES: usize = 10;
/// Samples in each of the two compared windows.
pub const TREND_WINDOW: usize = 5;
/// Relative change between windows that counts as movement.
pub const TREND_THRESHOLD: f64 = 0.05;

/// Direction a metric has moved recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Compare the mean of the last five samples with the five before them.
    ///
    /// `samples` is ordered oldest first.
    pub fn of<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: DoubleEndedIterator + ExactSizeIterator,
    {
        let iter = samples.into_iter();
        if iter.len() < MIN_TREND_SAMPLES {
            return Trend::Stable;
        }

        let tail: Vec<f64> = iter.rev().take(TREND_WINDOW * 2).copied().collect();
        let recent = mean(&tail[..TREND_WINDOW]);
        let older = mean(&tail[TREND_WINDOW..]);

        if older == 0.0 {
            return match recent.partial_cmp(&0.0) {
                Some(std::cmp::Ordering::Greater) => Trend::Increasing,
                Some(std::cmp::Ordering::Less) => Trend::Decreasing,
                _ => Trend::Stable,
            };
        }

        let change = (recent - older) / older.abs();
        if change > TREND_THRESHOLD {
            Trend::Increasing
        } else if change < -TREND_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_samples_is_stable() {
        assert_eq!(Trend::of(&[1.0, 100.0, 1000.0]), Trend::Stable);
        assert_eq!(Trend::of(&[0.0; 9]), Trend::Stable);
    }

    #[test]
    fn test_fps_recovery_is_increasing() {
        let fps = [10.0, 10.0, 10.0, 10.0, 10.0, 60.0, 60.0, 60.0, 60.0, 60.0];
        assert_eq!(Trend::of(&fps), Trend::Increasing);
    }

    #[test]
    fn test_decreasing() {
        let values = [60.0, 60.0, 60.0, 60.0, 60.0, 50.0, 50.0, 50.0, 50.0, 50.0];
        assert_eq!(Trend::of(&values), Trend::Decreasing);
    }

    #[test]
    fn test_small_change_is_stable() {
        let values = [100.0, 100.0, 100.0, 100.0, 100.0, 104.0, 104.0, 104.0, 104.0, 104.0];
        assert_eq!(Trend::of(&values), Trend::Stable);
    }

    #[test]
    fn test_only_last_ten_samples_count() {
        let mut values = vec![1000.0; 20];
        values.extend([50.0; 10]);
        assert_eq!(Trend::of(&values), Trend::Stable);
    }
}
