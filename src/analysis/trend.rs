//! Linear-regression trend detection
//!
//! Values are regressed against their position in the window, so readings are
//! treated as equally spaced regardless of the real time between them.

use serde::{Deserialize, Serialize};

use super::{is_degenerate, mean};

/// Default number of most recent values the trend is fitted over
pub const DEFAULT_TREND_WINDOW: usize = 20;

/// Fewest values for which a trend is reported
pub const MIN_TREND_SAMPLES: usize = 3;

/// Slopes at or below this magnitude count as flat
pub const STABLE_SLOPE: f64 = 0.01;

/// Trend direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Result of fitting a trend line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// |R²| of the fit, 0..1
    pub strength: f64,
    /// Change per reading
    pub slope: f64,
    pub r_squared: f64,
    /// `slope * 100`: a relative magnitude indicator, not a normalized percentage
    pub change_rate: f64,
}

impl TrendResult {
    /// Result for too few values
    pub fn insufficient() -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            strength: 0.0,
            slope: 0.0,
            r_squared: 0.0,
            change_rate: 0.0,
        }
    }
}

/// Least-squares trend over the most recent `window` values
#[derive(Debug, Clone, Copy)]
pub struct TrendDetector {
    window: usize,
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_WINDOW)
    }
}

impl TrendDetector {
    /// Detector fitting over the last `window` values
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_TREND_SAMPLES),
        }
    }

    /// Window size in values
    pub fn window(&self) -> usize {
        self.window
    }

    /// Classify the trend of an ordered value sequence
    pub fn detect(&self, values: &[f64]) -> TrendResult {
        if values.len() < MIN_TREND_SAMPLES {
            return TrendResult::insufficient();
        }

        let recent = &values[values.len().saturating_sub(self.window)..];
        let n = recent.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = mean(recent);

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in recent.iter().enumerate() {
            let dx = i as f64 - x_mean;
            numerator += dx * (y - y_mean);
            denominator += dx * dx;
        }

        let slope = if denominator != 0.0 { numerator / denominator } else { 0.0 };

        let ss_tot: f64 = recent.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = recent
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let predicted = y_mean + slope * (i as f64 - x_mean);
                (y - predicted).powi(2)
            })
            .sum();

        // A constant series is fitted perfectly by a flat line
        let r_squared = if is_degenerate(ss_tot.sqrt(), y_mean) {
            1.0
        } else {
            1.0 - ss_res / ss_tot
        };

        let direction = if slope.abs() <= STABLE_SLOPE {
            TrendDirection::Stable
        } else if slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        };

        TrendResult {
            direction,
            strength: r_squared.abs(),
            slope,
            r_squared,
            change_rate: slope * 100.0,
        }
    }
}
