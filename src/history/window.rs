//! Named recency windows over the history log

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reading::StoredReading;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Recency filter applied to the history log
#[derive(
    ValueEnum,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
)]
pub enum TimeWindow {
    /// Last hour
    #[value(name = "1hour")]
    #[serde(rename = "1hour")]
    OneHour,
    /// Last 6 hours
    #[value(name = "6hours")]
    #[serde(rename = "6hours")]
    SixHours,
    /// Last 12 hours
    #[value(name = "12hours")]
    #[serde(rename = "12hours")]
    TwelveHours,
    /// Last 24 hours
    #[default]
    #[value(name = "24hours")]
    #[serde(rename = "24hours")]
    Day,
    /// Last 7 days
    #[value(name = "7days")]
    #[serde(rename = "7days")]
    Week,
    /// Last 30 days
    #[value(name = "30days")]
    #[serde(rename = "30days")]
    Month,
    /// Whole history
    #[value(name = "all")]
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    /// Every window, narrowest first
    pub const ALL: [TimeWindow; 7] = [
        TimeWindow::OneHour,
        TimeWindow::SixHours,
        TimeWindow::TwelveHours,
        TimeWindow::Day,
        TimeWindow::Week,
        TimeWindow::Month,
        TimeWindow::All,
    ];

    /// Window length in milliseconds, `None` when unbounded
    pub fn duration_millis(&self) -> Option<i64> {
        match self {
            Self::OneHour => Some(HOUR_MS),
            Self::SixHours => Some(6 * HOUR_MS),
            Self::TwelveHours => Some(12 * HOUR_MS),
            Self::Day => Some(DAY_MS),
            Self::Week => Some(7 * DAY_MS),
            Self::Month => Some(30 * DAY_MS),
            Self::All => None,
        }
    }

    /// Wire name of the window
    pub fn name(&self) -> &'static str {
        match self {
            Self::OneHour => "1hour",
            Self::SixHours => "6hours",
            Self::TwelveHours => "12hours",
            Self::Day => "24hours",
            Self::Week => "7days",
            Self::Month => "30days",
            Self::All => "all",
        }
    }

    /// Keep readings with `timestamp >= now - duration`, preserving order
    pub fn filter(&self, readings: &[StoredReading], now_millis: i64) -> Vec<StoredReading> {
        match self.duration_millis() {
            None => readings.to_vec(),
            Some(duration) => {
                let cutoff = now_millis.saturating_sub(duration);
                readings
                    .iter()
                    .filter(|r| r.timestamp >= cutoff)
                    .cloned()
                    .collect()
            }
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
