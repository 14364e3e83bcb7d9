//! Configuration settings for MilkTrend
//!
//! Defines the analyzer settings, CLI arguments, and defaults.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{
    DEFAULT_ANOMALY_THRESHOLD, DEFAULT_SMOOTHING_ALPHA, DEFAULT_TREND_WINDOW, MIN_TREND_SAMPLES,
};
use crate::history::{TimeWindow, DEFAULT_MAX_HISTORY};
use crate::reading::Parameter;
use crate::report::DEFAULT_ALERT_SCORE;

/// Default history file, relative to the working directory
pub const DEFAULT_HISTORY_FILE: &str = "milktrend_history.json";

/// MilkTrend - Trend analysis for milk-quality sensor readings
#[derive(Parser, Debug, Clone)]
#[command(name = "milktrend")]
#[command(author = "MilkTrend Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trend, anomaly and forecast analysis for milk-quality sensors")]
#[command(long_about = r#"
MilkTrend keeps a bounded history of milk-quality sensor readings
(pH, temperature, turbidity, TDS, gas) and analyses it.

Features:
  - Descriptive statistics and stability per parameter
  - Linear-regression trend detection
  - Z-score anomaly detection
  - Double exponential smoothing forecasts
  - Pairwise parameter correlations
  - Quality-score trend with recommendations

Examples:
  milktrend ingest readings.json           # Store readings from a file
  cat reading.json | milktrend ingest      # Store a reading from stdin
  milktrend stats ph --window 24hours      # pH statistics for the last day
  milktrend report --window 7days          # Weekly trend report
  milktrend --output-format json dashboard # Dashboard metrics as JSON
"#)]
pub struct CliArgs {
    /// History file path
    #[arg(long, env = "MILKTREND_HISTORY", value_name = "PATH", global = true)]
    pub history_file: Option<PathBuf>,

    /// JSON configuration file; command-line flags override its values
    #[arg(short = 'c', long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of readings kept in history
    #[arg(long, value_name = "NUM", global = true)]
    pub capacity: Option<usize>,

    /// Number of most recent values used for trend detection
    #[arg(long, value_name = "NUM", global = true)]
    pub trend_window: Option<usize>,

    /// Quality score below which a reading counts as an alert
    #[arg(long, value_name = "SCORE", global = true)]
    pub alert_score: Option<f64>,

    /// Output format for reports
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output_format: OutputFormat,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Store readings from a JSON file (or stdin)
    #[command(name = "ingest")]
    Ingest {
        /// File holding one reading object or an array of readings
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// List stored readings, most recent last
    #[command(name = "history")]
    History {
        /// Only show the most recent N readings
        #[arg(short, long, value_name = "NUM")]
        limit: Option<usize>,
    },

    /// Clear the stored history
    #[command(name = "clear")]
    Clear,

    /// Descriptive statistics for one parameter
    #[command(name = "stats")]
    Stats {
        /// Parameter to analyse
        #[arg(value_enum)]
        parameter: Parameter,
        /// Time window
        #[arg(short, long, value_enum, default_value = "24hours")]
        window: TimeWindow,
    },

    /// Check the latest reading for anomalies
    #[command(name = "anomalies")]
    Anomalies {
        /// Parameter to check (all when omitted)
        #[arg(value_enum)]
        parameter: Option<Parameter>,
        /// Z-score threshold in standard deviations
        #[arg(short, long, value_name = "Z")]
        threshold: Option<f64>,
    },

    /// Forecast the next value
    #[command(name = "predict")]
    Predict {
        /// Parameter to forecast (all when omitted)
        #[arg(value_enum)]
        parameter: Option<Parameter>,
        /// Smoothing factor in (0, 1]
        #[arg(short, long, value_name = "ALPHA")]
        alpha: Option<f64>,
    },

    /// Quality-score trend
    #[command(name = "quality")]
    Quality {
        /// Time window
        #[arg(short, long, value_enum, default_value = "24hours")]
        window: TimeWindow,
    },

    /// Pairwise parameter correlations
    #[command(name = "correlations")]
    Correlations,

    /// Full trend report
    #[command(name = "report")]
    Report {
        /// Time window
        #[arg(short, long, value_enum, default_value = "24hours")]
        window: TimeWindow,
    },

    /// Headline dashboard metrics
    #[command(name = "dashboard")]
    Dashboard,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// History file path
    pub history_path: PathBuf,
    /// Maximum readings kept
    pub max_history: usize,
    /// Most recent values used for trend detection
    pub trend_window: usize,
    /// Default anomaly z-score threshold
    pub anomaly_threshold: f64,
    /// Default smoothing factor
    pub smoothing_alpha: f64,
    /// Quality score below which a reading counts as an alert
    pub alert_score_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            max_history: DEFAULT_MAX_HISTORY,
            trend_window: DEFAULT_TREND_WINDOW,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            alert_score_threshold: DEFAULT_ALERT_SCORE,
        }
    }
}

impl AnalyzerConfig {
    /// Load a configuration file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config '{}': {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config '{}': {}", path.display(), e))
    }

    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(path) = &args.history_file {
            config.history_path = path.clone();
        }
        if let Some(capacity) = args.capacity {
            config.max_history = capacity;
        }
        if let Some(window) = args.trend_window {
            config.trend_window = window;
        }
        if let Some(score) = args.alert_score {
            config.alert_score_threshold = score;
        }

        match &args.command {
            Commands::Anomalies {
                threshold: Some(threshold),
                ..
            } => config.anomaly_threshold = *threshold,
            Commands::Predict { alpha: Some(alpha), .. } => config.smoothing_alpha = *alpha,
            _ => {}
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.max_history < 1 {
            return Err("History capacity must be at least 1".to_string());
        }
        if self.trend_window < MIN_TREND_SAMPLES {
            return Err(format!("Trend window must be at least {}", MIN_TREND_SAMPLES));
        }
        validate_threshold(self.anomaly_threshold)?;
        validate_alpha(self.smoothing_alpha)?;
        if !self.alert_score_threshold.is_finite() {
            return Err("Alert score must be a finite number".to_string());
        }
        Ok(())
    }
}

/// Anomaly threshold must be a positive number of standard deviations
pub fn validate_threshold(threshold: f64) -> Result<(), String> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(format!("Invalid anomaly threshold: {}", threshold))
    }
}

/// Smoothing factor must lie in (0, 1]
pub fn validate_alpha(alpha: f64) -> Result<(), String> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(format!("Invalid smoothing alpha: {} (expected 0 < alpha <= 1)", alpha))
    }
}
