//! Z-score anomaly detection
//!
//! The most recent valid value of a parameter is scored against the mean and
//! standard deviation of every valid value in the slice it is given.

use serde::{Deserialize, Serialize, Serializer};

use super::{extract_values, is_degenerate, mean, population_variance};
use crate::reading::{Parameter, Reading};

/// Default z-score above which the latest value is flagged
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.5;

/// Fewest valid values needed before anything is flagged
pub const MIN_ANOMALY_SAMPLES: usize = 10;

/// Anomaly severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity for an absolute z-score
    pub fn from_z_score(z_score: f64) -> Self {
        if z_score > 3.0 {
            Self::Critical
        } else if z_score > 2.5 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// A flagged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Always set on a flagged value
    pub has_anomaly: bool,
    pub parameter: Parameter,
    pub current_value: f64,
    pub expected_mean: f64,
    /// Signed distance from the mean
    pub deviation: f64,
    /// Absolute z-score
    pub z_score: f64,
    pub severity: Severity,
    pub message: String,
}

/// Outcome of an anomaly check
///
/// Serializes flat with a `status` tag and a `hasAnomaly` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyResult {
    /// Fewer than [`MIN_ANOMALY_SAMPLES`] valid values
    InsufficientData { parameter: Parameter, count: usize },
    /// Latest value within the threshold, or a constant history
    Normal { parameter: Parameter, z_score: f64 },
    /// Latest value beyond the threshold
    Anomalous(Anomaly),
}

impl Serialize for AnomalyResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "status", rename_all = "snake_case")]
        enum Tagged<'a> {
            #[serde(rename_all = "camelCase")]
            InsufficientData {
                has_anomaly: bool,
                parameter: Parameter,
                count: usize,
            },
            #[serde(rename_all = "camelCase")]
            Normal {
                has_anomaly: bool,
                parameter: Parameter,
                z_score: f64,
            },
            Anomalous(&'a Anomaly),
        }

        let tagged = match self {
            Self::InsufficientData { parameter, count } => Tagged::InsufficientData {
                has_anomaly: false,
                parameter: *parameter,
                count: *count,
            },
            Self::Normal { parameter, z_score } => Tagged::Normal {
                has_anomaly: false,
                parameter: *parameter,
                z_score: *z_score,
            },
            Self::Anomalous(anomaly) => Tagged::Anomalous(anomaly),
        };
        tagged.serialize(serializer)
    }
}

impl AnomalyResult {
    /// Whether the latest value was flagged
    pub fn has_anomaly(&self) -> bool {
        matches!(self, Self::Anomalous(_))
    }

    /// The flagged anomaly, if any
    pub fn anomaly(&self) -> Option<&Anomaly> {
        match self {
            Self::Anomalous(anomaly) => Some(anomaly),
            _ => None,
        }
    }

    /// Consume into the flagged anomaly, if any
    pub fn into_anomaly(self) -> Option<Anomaly> {
        match self {
            Self::Anomalous(anomaly) => Some(anomaly),
            _ => None,
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> String {
        match self {
            Self::InsufficientData { .. } => "Insufficient data for anomaly detection".to_string(),
            Self::Normal { parameter, z_score } => {
                format!("{} within normal range ({:.2} std deviations)", parameter, z_score)
            }
            Self::Anomalous(anomaly) => anomaly.message.clone(),
        }
    }
}

/// Flags the latest value when it sits more than `threshold` standard
/// deviations from the mean
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ANOMALY_THRESHOLD)
    }
}

impl AnomalyDetector {
    /// Detector with a custom threshold in standard deviations
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Threshold in standard deviations
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Check the latest value of `parameter`
    pub fn detect<R: AsRef<Reading>>(&self, parameter: Parameter, readings: &[R]) -> AnomalyResult {
        let values = extract_values(parameter, readings);
        let current = match values.last() {
            Some(&current) if values.len() >= MIN_ANOMALY_SAMPLES => current,
            _ => {
                return AnomalyResult::InsufficientData {
                    parameter,
                    count: values.len(),
                }
            }
        };

        let avg = mean(&values);
        let std_dev = population_variance(&values).sqrt();

        // Nothing deviates from a constant history
        if is_degenerate(std_dev, avg) {
            return AnomalyResult::Normal {
                parameter,
                z_score: 0.0,
            };
        }

        let deviation = current - avg;
        let z_score = deviation.abs() / std_dev;

        if z_score <= self.threshold {
            return AnomalyResult::Normal { parameter, z_score };
        }

        tracing::debug!(
            "{} anomaly: value={} mean={:.3} z={:.2}",
            parameter,
            current,
            avg,
            z_score
        );

        AnomalyResult::Anomalous(Anomaly {
            has_anomaly: true,
            parameter,
            current_value: current,
            expected_mean: avg,
            deviation,
            z_score,
            severity: Severity::from_z_score(z_score),
            message: format!(
                "{} is {:.2} units {} normal ({:.2} std deviations)",
                parameter,
                deviation.abs(),
                if deviation > 0.0 { "above" } else { "below" },
                z_score
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gas_readings(values: &[f64]) -> Vec<Reading> {
        values.iter().map(|v| Reading::new().with(Parameter::Gas, *v)).collect()
    }

    fn clustered_around_100() -> Vec<f64> {
        (0..20).map(|i| 99.0 + (i % 3) as f64).collect()
    }

    #[test]
    fn test_spike_is_critical() {
        let mut values = clustered_around_100();
        values.push(200.0);

        let result = AnomalyDetector::default().detect(Parameter::Gas, &gas_readings(&values));
        assert!(result.has_anomaly());

        let anomaly = result.anomaly().unwrap();
        assert_eq!(anomaly.severity, Severity::Critical);
        assert_eq!(anomaly.current_value, 200.0);
        assert!(anomaly.deviation > 0.0);
        assert!(anomaly.z_score > 3.0);
        assert!(anomaly.message.starts_with("gas is "));
        assert!(anomaly.message.contains("above normal"));
    }

    #[test]
    fn test_drop_is_below() {
        let mut values = clustered_around_100();
        values.push(0.0);

        let result = AnomalyDetector::default().detect(Parameter::Gas, &gas_readings(&values));
        let anomaly = result.anomaly().unwrap();
        assert!(anomaly.deviation < 0.0);
        assert!(anomaly.message.contains("below normal"));
    }

    #[test]
    fn test_normal_value() {
        let values = clustered_around_100();
        let result = AnomalyDetector::default().detect(Parameter::Gas, &gas_readings(&values));
        assert!(!result.has_anomaly());
        assert!(matches!(result, AnomalyResult::Normal { .. }));
    }

    #[test]
    fn test_constant_history_never_anomalous() {
        let values = [4.0; 15];
        let result = AnomalyDetector::new(0.1).detect(Parameter::Gas, &gas_readings(&values));
        assert_eq!(
            result,
            AnomalyResult::Normal {
                parameter: Parameter::Gas,
                z_score: 0.0
            }
        );
    }

    #[test]
    fn test_insufficient_data() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let result = AnomalyDetector::default().detect(Parameter::Gas, &gas_readings(&values));
        assert_eq!(
            result,
            AnomalyResult::InsufficientData {
                parameter: Parameter::Gas,
                count: 9
            }
        );
        assert!(!result.has_anomaly());
    }

    #[test]
    fn test_serialized_shape_carries_flag() {
        let mut values = clustered_around_100();
        values.push(200.0);
        let detector = AnomalyDetector::default();
        let shape = |values: &[f64]| {
            serde_json::to_value(detector.detect(Parameter::Gas, &gas_readings(values))).unwrap()
        };

        let flagged = shape(&values);
        assert_eq!(flagged["status"], "anomalous");
        assert_eq!(flagged["hasAnomaly"], true);
        assert_eq!(flagged["severity"], "critical");
        assert_eq!(flagged["currentValue"], 200.0);
        assert!(flagged["zScore"].as_f64().unwrap() > 3.0);

        let normal = shape(&values[..20]);
        assert_eq!(normal["status"], "normal");
        assert_eq!(normal["hasAnomaly"], false);
        assert!(normal["zScore"].is_number());

        let short = shape(&values[..3]);
        assert_eq!(short["status"], "insufficient_data");
        assert_eq!(short["hasAnomaly"], false);
        assert_eq!(short["count"], 3);
    }

    #[test]
    fn test_flagged_anomaly_serializes_flag() {
        let mut values = clustered_around_100();
        values.push(200.0);
        let result = AnomalyDetector::default().detect(Parameter::Gas, &gas_readings(&values));
        let anomaly = result.into_anomaly().unwrap();
        assert!(anomaly.has_anomaly);

        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["hasAnomaly"], true);
        let back: Anomaly = serde_json::from_value(json).unwrap();
        assert_eq!(back, anomaly);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_z_score(3.5), Severity::Critical);
        assert_eq!(Severity::from_z_score(2.8), Severity::High);
        assert_eq!(Severity::from_z_score(2.1), Severity::Medium);
    }

    #[test]
    fn test_lower_threshold_yields_medium() {
        let mut values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 9.0 } else { 11.0 }).collect();
        values.push(12.2);

        let result = AnomalyDetector::new(1.0).detect(Parameter::Gas, &gas_readings(&values));
        assert_eq!(result.anomaly().unwrap().severity, Severity::Medium);
    }
}
