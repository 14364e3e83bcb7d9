//! One-step-ahead forecasting with double exponential smoothing
//!
//! Level and trend are rebuilt from the first value on every call; no
//! smoothing state is carried between calls.

use serde::{Deserialize, Serialize};

use super::{extract_values, is_degenerate, mean, population_variance};
use crate::reading::{Parameter, Reading};

/// Default smoothing factor
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;

/// Fewest valid values needed for a forecast
pub const MIN_FORECAST_SAMPLES: usize = 5;

/// Number of trailing values the confidence estimate looks at
pub const CONFIDENCE_SAMPLES: usize = 10;

const MIN_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.95;

/// Approximate band around a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRange {
    pub lower: f64,
    pub upper: f64,
}

/// Forecast of the next value of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub parameter: Parameter,
    pub predicted: f64,
    /// Heuristic confidence, 0.5..=0.95
    pub confidence: f64,
    /// `predicted ± |predicted| * confidence / 200`; a proportional band, not
    /// a statistical confidence interval
    pub range: PredictionRange,
}

/// Holt-style level + trend smoother
#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    alpha: f64,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA)
    }
}

impl Forecaster {
    /// Forecaster with smoothing factor `alpha` (clamped to `(0, 1]`)
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() && alpha > 0.0 {
            alpha.min(1.0)
        } else {
            DEFAULT_SMOOTHING_ALPHA
        };
        Self { alpha }
    }

    /// Smoothing factor in use
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Predict the next value of `parameter`, or `None` with too little data
    pub fn predict<R: AsRef<Reading>>(
        &self,
        parameter: Parameter,
        readings: &[R],
    ) -> Option<Prediction> {
        let values = extract_values(parameter, readings);
        let predicted = self.smooth(&values)?;
        let confidence = confidence(&values);
        let half_width = predicted.abs() * confidence / 200.0;

        Some(Prediction {
            parameter,
            predicted,
            confidence,
            range: PredictionRange {
                lower: predicted - half_width,
                upper: predicted + half_width,
            },
        })
    }

    /// Final level + trend after smoothing `values`
    pub fn smooth(&self, values: &[f64]) -> Option<f64> {
        if values.len() < MIN_FORECAST_SAMPLES {
            return None;
        }

        let alpha = self.alpha;
        let mut level = values[0];
        let mut trend = values[1] - values[0];

        for &value in &values[1..] {
            let prev_level = level;
            level = alpha * value + (1.0 - alpha) * (level + trend);
            trend = alpha * (level - prev_level) + (1.0 - alpha) * trend;
        }

        Some(level + trend)
    }
}

/// `1 - cv` of the trailing values, clamped to 0.5..=0.95
fn confidence(values: &[f64]) -> f64 {
    if values.len() < CONFIDENCE_SAMPLES {
        return MIN_CONFIDENCE;
    }

    let recent = &values[values.len() - CONFIDENCE_SAMPLES..];
    let avg = mean(recent);
    if is_degenerate(avg.abs(), 0.0) {
        return MIN_CONFIDENCE;
    }

    let cv = population_variance(recent).sqrt() / avg.abs();
    (1.0 - cv).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
