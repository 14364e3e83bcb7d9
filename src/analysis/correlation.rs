//! Pairwise Pearson correlation between parameters
//!
//! Each parameter's valid values are extracted independently and the two
//! sequences are paired by position after truncating to the shorter one.
//! When two parameters go missing on different readings this pairs values
//! from different readings; pairing by timestamp would change the results,
//! so positional pairing is kept as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{extract_values, is_degenerate};
use crate::reading::{Parameter, Reading};

/// Fewest paired values for a coefficient
pub const MIN_CORRELATION_PAIRS: usize = 10;

/// Fewest readings before a full correlation set is computed
pub const MIN_CORRELATION_READINGS: usize = 20;

/// Strength band of |coefficient|
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    None,
    Weak,
    Moderate,
    Strong,
    /// Fewer than [`MIN_CORRELATION_PAIRS`] pairs
    InsufficientData,
    /// One of the sequences is constant
    Undefined,
}

impl CorrelationStrength {
    /// Band for a coefficient
    pub fn from_coefficient(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude > 0.7 {
            Self::Strong
        } else if magnitude > 0.4 {
            Self::Moderate
        } else if magnitude > 0.2 {
            Self::Weak
        } else {
            Self::None
        }
    }
}

/// Sign of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

/// Correlation between two parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Pearson coefficient, -1..=1
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    /// Absent when there is no coefficient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<CorrelationDirection>,
}

impl CorrelationResult {
    fn without_coefficient(strength: CorrelationStrength) -> Self {
        Self {
            coefficient: 0.0,
            strength,
            direction: None,
        }
    }
}

/// Key for an unordered parameter pair, e.g. `ph_temperature`
pub fn pair_key(a: Parameter, b: Parameter) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", first, second)
}

/// Pearson correlation across parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    /// Create an analyzer
    pub fn new() -> Self {
        Self
    }

    /// Correlate two parameters over `readings`
    pub fn correlate<R: AsRef<Reading>>(
        &self,
        a: Parameter,
        b: Parameter,
        readings: &[R],
    ) -> CorrelationResult {
        let mut xs = extract_values(a, readings);
        let mut ys = extract_values(b, readings);

        let n = xs.len().min(ys.len());
        if n < MIN_CORRELATION_PAIRS {
            return CorrelationResult::without_coefficient(CorrelationStrength::InsufficientData);
        }
        xs.truncate(n);
        ys.truncate(n);

        match pearson(&xs, &ys) {
            Some(coefficient) => CorrelationResult {
                coefficient,
                strength: CorrelationStrength::from_coefficient(coefficient),
                direction: Some(if coefficient > 0.0 {
                    CorrelationDirection::Positive
                } else {
                    CorrelationDirection::Negative
                }),
            },
            None => CorrelationResult::without_coefficient(CorrelationStrength::Undefined),
        }
    }

    /// Correlate every unordered pair of `parameters`
    ///
    /// Returns `None` when fewer than [`MIN_CORRELATION_READINGS`] readings
    /// are supplied.
    pub fn correlate_all<R: AsRef<Reading>>(
        &self,
        parameters: &[Parameter],
        readings: &[R],
    ) -> Option<BTreeMap<String, CorrelationResult>> {
        if readings.len() < MIN_CORRELATION_READINGS {
            return None;
        }

        let correlations = Parameter::pairs(parameters)
            .into_iter()
            .map(|(a, b)| (pair_key(a, b), self.correlate(a, b, readings)))
            .collect();
        Some(correlations)
    }
}

/// Pearson coefficient with population sums; `None` when either side is constant
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if is_degenerate(var_x.sqrt(), mean_x) || is_degenerate(var_y.sqrt(), mean_y) {
        return None;
    }

    Some((covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}
