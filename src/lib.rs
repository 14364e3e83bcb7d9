//! # MilkTrend - Trend Analysis for Milk-Quality Sensors
//!
//! MilkTrend keeps a bounded, persisted history of milk-quality sensor
//! readings and derives statistics, trends, anomalies, forecasts and
//! correlations from it.
//!
//! ## Features
//!
//! - **Bounded History**: FIFO log of the most recent readings, persisted as JSON
//! - **Time Windows**: Named recency filters from one hour to thirty days
//! - **Statistics**: Mean, median, spread and a coefficient-of-variation stability label
//! - **Trend Detection**: Least-squares regression over a sliding window
//! - **Anomaly Detection**: Z-score of the latest value with severity bands
//! - **Forecasting**: Double exponential smoothing with a confidence range
//! - **Correlations**: Pairwise Pearson coefficients between parameters
//! - **Quality Trend**: Score trend with actionable recommendations
//!
//! ## Quick Start
//!
//! ```no_run
//! use milktrend::config::AnalyzerConfig;
//! use milktrend::history::TimeWindow;
//! use milktrend::reading::{Parameter, Reading};
//! use milktrend::TrendAnalyzer;
//!
//! let analyzer = TrendAnalyzer::open(&AnalyzerConfig::default()).unwrap();
//!
//! let reading = Reading::new()
//!     .with(Parameter::Ph, 6.62)
//!     .with(Parameter::Temperature, 4.1);
//! analyzer.store_reading(reading).unwrap();
//!
//! if let Some(stats) = analyzer.get_parameter_stats(Parameter::Ph, TimeWindow::Day) {
//!     println!("pH mean {:.2} ({})", stats.mean, stats.stability.name());
//! }
//! ```
//!
//! ## Deterministic Analysis
//!
//! ```
//! use std::sync::Arc;
//! use milktrend::clock::ManualClock;
//! use milktrend::config::AnalyzerConfig;
//! use milktrend::history::{MemoryBackend, TimeWindow};
//! use milktrend::reading::{Parameter, Reading};
//! use milktrend::report::RecordedScorer;
//! use milktrend::TrendAnalyzer;
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let analyzer = TrendAnalyzer::with_backend(
//!     Box::new(MemoryBackend::new()),
//!     clock.clone(),
//!     &AnalyzerConfig::default(),
//! )
//! .with_scorer(RecordedScorer);
//!
//! for i in 0..30 {
//!     let reading = Reading::new().with(Parameter::Tds, 500.0 + i as f64);
//!     analyzer.store_reading(reading).unwrap();
//!     clock.advance(60_000);
//! }
//!
//! let report = analyzer.generate_trend_report(TimeWindow::Day);
//! assert_eq!(report.data_points, 30);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod analyzer;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod reading;
pub mod report;

// Re-export commonly used types
pub use analyzer::TrendAnalyzer;
pub use config::AnalyzerConfig;
pub use error::{MilkTrendError, Result};
pub use history::TimeWindow;
pub use reading::{Parameter, Reading, StoredReading};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use milktrend::prelude::*;
    //! ```

    pub use crate::analysis::{
        AnomalyResult, CorrelationResult, ParameterStats, Prediction, Stability, TrendDirection,
    };
    pub use crate::analyzer::TrendAnalyzer;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::AnalyzerConfig;
    pub use crate::error::{MilkTrendError, Result};
    pub use crate::history::{
        HistoryBackend, HistoryStore, JsonFileBackend, MemoryBackend, TimeWindow,
    };
    pub use crate::reading::{Parameter, Reading, StoredReading};
    pub use crate::report::{
        DashboardMetrics, QualityScorer, QualityTrend, RecordedScorer, TrendReport,
    };
}
