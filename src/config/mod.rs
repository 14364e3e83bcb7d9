//! Configuration module for MilkTrend
//!
//! Provides analyzer settings, CLI arguments, and config-file loading.

mod settings;

pub use settings::*;
