//! MilkTrend CLI - Trend analysis for milk-quality sensor readings
//!
//! Stores readings in a bounded JSON history and reports statistics, trends,
//! anomalies, forecasts and correlations over it.

use clap::Parser;
use milktrend::analysis::{AnomalyResult, ParameterStats, Prediction};
use milktrend::config::{AnalyzerConfig, CliArgs, Commands, OutputFormat};
use milktrend::error::{MilkTrendError, Result};
use milktrend::history::TimeWindow;
use milktrend::reading::{Parameter, Reading, StoredReading};
use milktrend::report::RecordedScorer;
use milktrend::TrendAnalyzer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG wins over -v
    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    // Build configuration
    let config = AnalyzerConfig::from_cli(&args).map_err(MilkTrendError::config)?;

    if args.verbose > 0 {
        print_config(&config);
    }

    let analyzer = TrendAnalyzer::open(&config)?.with_scorer(RecordedScorer);
    handle_command(&analyzer, &args.command, args.output_format)
}

fn handle_command(
    analyzer: &TrendAnalyzer,
    command: &Commands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Ingest { file } => cmd_ingest(analyzer, file.as_deref(), format),
        Commands::History { limit } => cmd_history(analyzer, *limit, format),
        Commands::Clear => cmd_clear(analyzer, format),
        Commands::Stats { parameter, window } => cmd_stats(analyzer, *parameter, *window, format),
        Commands::Anomalies {
            parameter,
            threshold,
        } => cmd_anomalies(analyzer, *parameter, *threshold, format),
        Commands::Predict { parameter, alpha } => cmd_predict(analyzer, *parameter, *alpha, format),
        Commands::Quality { window } => {
            let trend = analyzer.get_quality_trend(*window);
            match format {
                OutputFormat::Json => print_json(&trend),
                OutputFormat::Text => {
                    println!("=== Quality Trend ({}) ===", window);
                    println!("Trend:       {}", trend.trend.name());
                    if let (Some(current), Some(change)) =
                        (trend.current_score, trend.recent_change)
                    {
                        println!("Current:     {:.1} ({:+.1})", current, change);
                        println!("Change rate: {:.1}% per reading", trend.change_rate);
                        println!("Strength:    {:.2}", trend.strength);
                    }
                    println!("{}", trend.message);
                    if let Some(rec) = &trend.recommendation {
                        println!("[{:?}] {}", rec.priority, rec.action);
                    }
                    Ok(())
                }
            }
        }
        Commands::Correlations => {
            let correlations = analyzer.get_parameter_correlations();
            match format {
                OutputFormat::Json => print_json(&correlations),
                OutputFormat::Text => {
                    println!("=== Correlations ===");
                    match correlations {
                        None => println!("Insufficient data (need at least 20 readings)"),
                        Some(correlations) => {
                            for (pair, c) in &correlations {
                                let direction =
                                    c.direction.map(|d| format!("{:?}", d)).unwrap_or_default();
                                println!(
                                    "{:22} {:>7.3}  {:?} {}",
                                    pair, c.coefficient, c.strength, direction
                                );
                            }
                        }
                    }
                    Ok(())
                }
            }
        }
        Commands::Report { window } => {
            let report = analyzer.generate_trend_report(*window);
            match format {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Text => {
                    report.print_summary();
                    Ok(())
                }
            }
        }
        Commands::Dashboard => {
            let metrics = analyzer.get_dashboard_metrics();
            match format {
                OutputFormat::Json => print_json(&metrics),
                OutputFormat::Text => {
                    metrics.print_summary();
                    Ok(())
                }
            }
        }
    }
}

fn cmd_ingest(analyzer: &TrendAnalyzer, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| MilkTrendError::io(path, e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| MilkTrendError::io("<stdin>", e))?;
            buf
        }
    };

    let readings = Reading::parse_batch(&input)?;
    let mut stored = Vec::with_capacity(readings.len());
    for reading in readings {
        stored.push(analyzer.store_reading(reading)?);
    }

    match format {
        OutputFormat::Json => print_json(&stored),
        OutputFormat::Text => {
            println!("=== Ingested {} reading(s) ===", stored.len());
            for entry in &stored {
                print_reading(entry);
            }
            println!("History size: {}/{}", analyzer.store().len(), analyzer.store().capacity());
            Ok(())
        }
    }
}

fn cmd_history(analyzer: &TrendAnalyzer, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let history = analyzer.get_history();
    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
    let shown = &history[skip..];

    match format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Text => {
            println!("=== History ({} of {}) ===", shown.len(), history.len());
            for entry in shown {
                print_reading(entry);
            }
            Ok(())
        }
    }
}

fn cmd_clear(analyzer: &TrendAnalyzer, format: OutputFormat) -> Result<()> {
    let removed = analyzer.store().len();
    analyzer.clear_history()?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "cleared": removed })),
        OutputFormat::Text => {
            println!("Cleared {} reading(s)", removed);
            Ok(())
        }
    }
}

fn cmd_stats(
    analyzer: &TrendAnalyzer,
    parameter: Parameter,
    window: TimeWindow,
    format: OutputFormat,
) -> Result<()> {
    let stats = analyzer.get_parameter_stats(parameter, window);

    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            match stats {
                Some(stats) => print_stats(&stats, window),
                None => println!("No {} data in the last {}", parameter, window),
            }
            Ok(())
        }
    }
}

fn cmd_anomalies(
    analyzer: &TrendAnalyzer,
    parameter: Option<Parameter>,
    threshold: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let results: BTreeMap<Parameter, AnomalyResult> = match parameter {
        Some(p) => BTreeMap::from([(p, analyzer.detect_anomalies(p, threshold))]),
        None => analyzer.detect_all_anomalies(threshold),
    };

    match format {
        OutputFormat::Json => match parameter.and_then(|p| results.get(&p)) {
            Some(single) => print_json(single),
            None => print_json(&results),
        },
        OutputFormat::Text => {
            println!("=== Anomalies ===");
            for (p, result) in &results {
                let label = match result {
                    AnomalyResult::Anomalous(a) => format!("{:?}", a.severity).to_uppercase(),
                    AnomalyResult::Normal { .. } => "ok".to_string(),
                    AnomalyResult::InsufficientData { .. } => "-".to_string(),
                };
                println!("{:12} {:>8}  {}", p.name(), label, result.message());
            }
            Ok(())
        }
    }
}

fn cmd_predict(
    analyzer: &TrendAnalyzer,
    parameter: Option<Parameter>,
    alpha: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    match parameter {
        Some(p) => {
            let prediction = analyzer.predict_next_value(p, alpha);
            match format {
                OutputFormat::Json => print_json(&prediction),
                OutputFormat::Text => {
                    println!("=== Prediction ===");
                    match &prediction {
                        Some(prediction) => print_prediction(prediction),
                        None => {
                            println!("{:12} insufficient data (need at least 5 values)", p.name())
                        }
                    }
                    Ok(())
                }
            }
        }
        None => {
            let predictions = analyzer.predict_all(alpha);
            match format {
                OutputFormat::Json => print_json(&predictions),
                OutputFormat::Text => {
                    println!("=== Predictions ===");
                    if predictions.is_empty() {
                        println!("Insufficient data (need at least 5 values per parameter)");
                    }
                    for prediction in predictions.values() {
                        print_prediction(prediction);
                    }
                    Ok(())
                }
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_reading(entry: &StoredReading) {
    let values: Vec<String> = Parameter::ALL
        .iter()
        .filter_map(|p| p.value(&entry.reading).map(|v| format!("{}={}", p, v)))
        .collect();
    let score = entry
        .reading
        .quality_score
        .map(|s| format!("  score={:.1}", s))
        .unwrap_or_default();
    println!("{}  {}{}", entry.date, values.join(" "), score);
}

fn print_stats(stats: &ParameterStats, window: TimeWindow) {
    println!("=== {} ({}) ===", stats.parameter, window);
    println!("Readings:  {}", stats.count);
    println!("Current:   {:.3}", stats.current);
    println!("Mean:      {:.3}", stats.mean);
    println!("Median:    {:.3}", stats.median);
    println!("Min/Max:   {:.3} / {:.3}", stats.min, stats.max);
    println!("Std dev:   {:.3}", stats.std_dev);
    println!("Stability: {}", stats.stability.name());
    println!(
        "Trend:     {} (slope {:.4}, R² {:.3})",
        stats.trend.direction.name(),
        stats.trend.slope,
        stats.trend.r_squared
    );
}

fn print_prediction(prediction: &Prediction) {
    println!(
        "{:12} {:>9.3}  ({:.3} .. {:.3}, confidence {:.0}%)",
        prediction.parameter.name(),
        prediction.predicted,
        prediction.range.lower,
        prediction.range.upper,
        prediction.confidence * 100.0
    );
}

fn print_config(config: &AnalyzerConfig) {
    eprintln!("=== Configuration ===");
    eprintln!("History file:    {}", config.history_path.display());
    eprintln!("Max history:     {}", config.max_history);
    eprintln!("Trend window:    {}", config.trend_window);
    eprintln!("Anomaly z:       {}", config.anomaly_threshold);
    eprintln!("Smoothing alpha: {}", config.smoothing_alpha);
    eprintln!("Alert score:     {}", config.alert_score_threshold);
    eprintln!();
}
