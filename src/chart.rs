use serde::Serialize;

use crate::models::DisplayMetric;

pub fn metric_title(metric: DisplayMetric) -> &'static str {
    match metric {
        DisplayMetric::Raw => "Raw score distribution (synthetic)",
        DisplayMetric::Diff => "Deviation from mean (synthetic distribution)",
        DisplayMetric::Ratio => "Distribution context (ratios, reference only)",
    }
}

/// A / B / other shares of the class, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StackedBar {
    pub a: f64,
    pub b: f64,
    pub other: f64,
}

impl StackedBar {
    /// Total over any input: B and other floor at zero when the ratios are
    /// inconsistent.
    pub fn from_ratios(a_ratio: f64, ab_ratio: f64) -> Self {
        Self {
            a: a_ratio,
            b: (ab_ratio - a_ratio).max(0.0),
            other: (100.0 - ab_ratio).max(0.0),
        }
    }
}

pub const RANGE_BAND_HALF_WIDTH: f64 = 10.0;

/// Estimated percentile band (lower is better) picked from the raw-score
/// deviation alone. This is a separate heuristic from the signal score and
/// the two are not expected to agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeBar {
    pub center: f64,
    pub low: f64,
    pub high: f64,
}

impl RangeBar {
    pub fn from_deviation(deviation: f64) -> Self {
        let center = if deviation > 10.0 {
            20.0
        } else if deviation > 5.0 {
            30.0
        } else if deviation > 0.0 {
            40.0
        } else {
            55.0
        };
        Self {
            center,
            low: (center - RANGE_BAND_HALF_WIDTH).max(0.0),
            high: (center + RANGE_BAND_HALF_WIDTH).min(100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn inconsistent_ratios_floor_b_at_zero() {
        let bar = StackedBar::from_ratios(45.0, 10.0);
        assert_eq!(bar.a, 45.0);
        assert_eq!(bar.b, 0.0);
        assert_eq!(bar.other, 90.0);
    }

    #[test]
    fn range_bar_buckets() {
        assert_eq!(RangeBar::from_deviation(13.0).center, 20.0);
        assert_eq!(RangeBar::from_deviation(10.0).center, 30.0);
        assert_eq!(RangeBar::from_deviation(5.0).center, 40.0);
        assert_eq!(RangeBar::from_deviation(0.0).center, 55.0);
        assert_eq!(RangeBar::from_deviation(-12.0).center, 55.0);

        let bar = RangeBar::from_deviation(7.5);
        assert_eq!((bar.low, bar.high), (20.0, 40.0));
    }

    #[test]
    fn metric_only_changes_the_title() {
        assert_ne!(metric_title(DisplayMetric::Raw), metric_title(DisplayMetric::Diff));
        assert_ne!(metric_title(DisplayMetric::Diff), metric_title(DisplayMetric::Ratio));
    }

    proptest! {
        #[test]
        fn consistent_ratios_sum_to_100(a in 0u32..=100, extra in 0u32..=100) {
            let a = f64::from(a);
            let ab = (a + f64::from(extra)).min(100.0);
            let bar = StackedBar::from_ratios(a, ab);
            prop_assert!((bar.a + bar.b + bar.other - 100.0).abs() < 1e-9);
        }

        #[test]
        fn range_band_stays_on_the_axis(deviation in -100.0..100.0f64) {
            let bar = RangeBar::from_deviation(deviation);
            prop_assert!(bar.low >= 0.0 && bar.high <= 100.0);
            prop_assert!((bar.high - bar.low - 2.0 * RANGE_BAND_HALF_WIDTH).abs() < 1e-9);
        }
    }
}
