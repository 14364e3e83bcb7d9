//! Headline metrics for the whole history

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::scorer::{score_readings, QualityScorer};
use crate::reading::StoredReading;

/// Score below which a reading counts as an alert
pub const DEFAULT_ALERT_SCORE: f64 = 60.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// How much history backs the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// More than 50 readings
    Excellent,
    /// More than 20 readings
    Good,
    Limited,
}

impl DataQuality {
    /// Label for a reading count
    pub fn from_count(count: usize) -> Self {
        if count > 50 {
            Self::Excellent
        } else if count > 20 {
            Self::Good
        } else {
            Self::Limited
        }
    }
}

/// Dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_readings: usize,
    /// Mean quality score over every scored reading
    pub avg_quality: f64,
    /// Readings scoring below the alert threshold
    pub alerts: usize,
    /// Hours between the first and last reading
    pub uptime_hours: f64,
    pub data_quality: DataQuality,
}

impl DashboardMetrics {
    /// All-zero metrics for an empty history
    pub fn empty() -> Self {
        Self {
            total_readings: 0,
            avg_quality: 0.0,
            alerts: 0,
            uptime_hours: 0.0,
            data_quality: DataQuality::Limited,
        }
    }

    /// Compute metrics over `readings` (oldest first)
    pub fn compute(
        readings: &[StoredReading],
        scorer: Option<&dyn QualityScorer>,
        alert_score: f64,
    ) -> Self {
        let (first, last) = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Self::empty(),
        };

        let scores = score_readings(scorer, readings);
        let avg_quality = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            total_readings: readings.len(),
            avg_quality,
            alerts: scores.iter().filter(|s| **s < alert_score).count(),
            uptime_hours: (last.timestamp - first.timestamp) as f64 / MILLIS_PER_HOUR,
            data_quality: DataQuality::from_count(readings.len()),
        }
    }

    /// Print summary
    pub fn print_summary(&self) {
        let uptime = Duration::from_secs_f64((self.uptime_hours * 3600.0).max(0.0).round());

        println!("=== Dashboard ===");
        println!("Readings:     {}", self.total_readings);
        println!("Avg quality:  {:.1}", self.avg_quality);
        println!("Alerts:       {}", self.alerts);
        println!(
            "Uptime:       {:.1} h ({})",
            self.uptime_hours,
            humantime::format_duration(uptime)
        );
        println!("Data quality: {:?}", self.data_quality);
    }
}
