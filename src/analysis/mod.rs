//! Statistical analysis over reading history
//!
//! Every result here is a pure function of a slice of readings: nothing is
//! cached between calls, so callers can hand in any window of the log.
//!
//! | Component | Technique |
//! |-----------|-----------|
//! | [`StatisticsEngine`] | Descriptive statistics, coefficient-of-variation stability |
//! | [`TrendDetector`] | Least-squares slope and R² over a sliding window |
//! | [`AnomalyDetector`] | Z-score of the latest value against the full distribution |
//! | [`Forecaster`] | Double exponential smoothing, one step ahead |
//! | [`CorrelationAnalyzer`] | Pairwise Pearson correlation |

mod anomaly;
mod correlation;
mod forecast;
mod stats;
mod trend;

pub use anomaly::*;
pub use correlation::*;
pub use forecast::*;
pub use stats::*;
pub use trend::*;

use crate::reading::{Parameter, Reading};

/// Valid values of `parameter`, in reading order. Absent fields are skipped.
pub fn extract_values<R: AsRef<Reading>>(parameter: Parameter, readings: &[R]) -> Vec<f64> {
    readings
        .iter()
        .filter_map(|r| parameter.value(r.as_ref()))
        .filter(|v| v.is_finite())
        .collect()
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n), 0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64
}

/// Whether a spread is too small to divide by, relative to the data's scale
pub(crate) fn is_degenerate(spread: f64, scale: f64) -> bool {
    spread <= 1e-12 * scale.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_values_skips_missing() {
        let readings = vec![
            Reading::new().with(Parameter::Ph, 6.5),
            Reading::new().with(Parameter::Gas, 80.0),
            Reading::new().with(Parameter::Ph, 6.7),
        ];
        assert_eq!(extract_values(Parameter::Ph, &readings), vec![6.5, 6.7]);
        assert!(extract_values(Parameter::Tds, &readings).is_empty());
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(population_variance(&values), 4.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
    }

    #[test]
    fn test_is_degenerate() {
        assert!(is_degenerate(0.0, 0.0));
        assert!(is_degenerate(1e-15, 100.0));
        assert!(!is_degenerate(0.01, 100.0));
    }
}
