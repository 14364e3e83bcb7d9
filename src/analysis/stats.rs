//! Descriptive statistics per parameter

use serde::{Deserialize, Serialize};

use super::{extract_values, mean, population_variance, TrendDetector, TrendResult};
use crate::reading::{Parameter, Reading};

/// Stability label derived from the coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    VeryStable,
    Stable,
    Moderate,
    Unstable,
    VeryUnstable,
    /// Mean of zero, coefficient of variation undefined
    Unknown,
}

impl Stability {
    /// Classify from standard deviation and mean
    pub fn classify(std_dev: f64, mean: f64) -> Self {
        if mean == 0.0 {
            return Self::Unknown;
        }

        let cv = std_dev / mean.abs() * 100.0;
        if cv < 5.0 {
            Self::VeryStable
        } else if cv < 10.0 {
            Self::Stable
        } else if cv < 20.0 {
            Self::Moderate
        } else if cv < 30.0 {
            Self::Unstable
        } else {
            Self::VeryUnstable
        }
    }

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            Self::VeryStable => "very_stable",
            Self::Stable => "stable",
            Self::Moderate => "moderate",
            Self::Unstable => "unstable",
            Self::VeryUnstable => "very_unstable",
            Self::Unknown => "unknown",
        }
    }
}

/// Summary statistics for one parameter over a set of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStats {
    pub parameter: Parameter,
    /// Most recent valid value
    pub current: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    /// Population variance
    pub variance: f64,
    /// Number of valid values
    pub count: usize,
    pub trend: TrendResult,
    pub stability: Stability,
}

/// Computes [`ParameterStats`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsEngine {
    trend: TrendDetector,
}

impl StatisticsEngine {
    /// Engine embedding trends from `trend`
    pub fn new(trend: TrendDetector) -> Self {
        Self { trend }
    }

    /// Statistics for `parameter`, or `None` when no reading carries it
    pub fn compute<R: AsRef<Reading>>(
        &self,
        parameter: Parameter,
        readings: &[R],
    ) -> Option<ParameterStats> {
        let values = extract_values(parameter, readings);
        let current = *values.last()?;

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let avg = mean(&values);
        let variance = population_variance(&values);
        let std_dev = variance.sqrt();

        Some(ParameterStats {
            parameter,
            current,
            mean: avg,
            // Lower-middle element for even counts, no interpolation
            median: sorted[(sorted.len() - 1) / 2],
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            std_dev,
            variance,
            count: values.len(),
            trend: self.trend.detect(&values),
            stability: Stability::classify(std_dev, avg),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TrendDirection;

    fn ph_readings(values: &[f64]) -> Vec<Reading> {
        values.iter().map(|v| Reading::new().with(Parameter::Ph, *v)).collect()
    }

    #[test]
    fn test_basic_stats() {
        let readings = ph_readings(&[6.4, 6.5, 6.6, 6.7, 6.8]);
        let stats = StatisticsEngine::default().compute(Parameter::Ph, &readings).unwrap();

        assert!((stats.mean - 6.6).abs() < 1e-9);
        assert!((stats.std_dev - 0.141421356).abs() < 1e-6);
        assert!((stats.variance - 0.02).abs() < 1e-9);
        assert_eq!(stats.median, 6.6);
        assert_eq!(stats.min, 6.4);
        assert_eq!(stats.max, 6.8);
        assert_eq!(stats.current, 6.8);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.stability, Stability::VeryStable);
        assert_eq!(stats.trend.direction, TrendDirection::Increasing);
    }

    #[test]
    fn test_even_count_median_is_lower_middle() {
        let readings = ph_readings(&[4.0, 1.0, 3.0, 2.0]);
        let stats = StatisticsEngine::default().compute(Parameter::Ph, &readings).unwrap();
        assert_eq!(stats.median, 2.0);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let mut readings = ph_readings(&[6.5, 6.7]);
        readings.insert(1, Reading::new().with(Parameter::Gas, 90.0));

        let stats = StatisticsEngine::default().compute(Parameter::Ph, &readings).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.trend.direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn test_constant_ph_has_full_strength_trend() {
        let readings = ph_readings(&[6.6; 20]);
        let stats = StatisticsEngine::default().compute(Parameter::Ph, &readings).unwrap();
        assert_eq!(stats.trend.direction, TrendDirection::Stable);
        assert_eq!(stats.trend.r_squared, 1.0);
        assert_eq!(stats.trend.strength, 1.0);
    }

    #[test]
    fn test_no_values_is_none() {
        let readings = vec![Reading::new().with(Parameter::Gas, 90.0)];
        assert!(StatisticsEngine::default().compute(Parameter::Ph, &readings).is_none());

        let empty: Vec<Reading> = Vec::new();
        assert!(StatisticsEngine::default().compute(Parameter::Ph, &empty).is_none());
    }

    #[test]
    fn test_stability_bands() {
        assert_eq!(Stability::classify(1.0, 100.0), Stability::VeryStable);
        assert_eq!(Stability::classify(7.0, 100.0), Stability::Stable);
        assert_eq!(Stability::classify(15.0, -100.0), Stability::Moderate);
        assert_eq!(Stability::classify(25.0, 100.0), Stability::Unstable);
        assert_eq!(Stability::classify(30.0, 100.0), Stability::VeryUnstable);
        assert_eq!(Stability::classify(3.0, 0.0), Stability::Unknown);
    }
}
