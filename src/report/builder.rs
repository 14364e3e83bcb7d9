//! Point-in-time trend report over a window of readings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dashboard::{DashboardMetrics, DEFAULT_ALERT_SCORE};
use super::quality::QualityTrend;
use super::scorer::{score_readings, QualityScorer};
use crate::analysis::{
    Anomaly, AnomalyDetector, CorrelationAnalyzer, CorrelationResult, Forecaster, ParameterStats,
    Prediction, StatisticsEngine, TrendDetector,
};
use crate::history::TimeWindow;
use crate::reading::{format_millis, Parameter, StoredReading};

/// Full report for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub time_range: TimeWindow,
    /// Generation time, RFC 3339 UTC
    pub timestamp: String,
    /// Readings inside the window
    pub data_points: usize,
    /// Statistics per parameter; `None` when the parameter has no values
    pub parameters: BTreeMap<Parameter, Option<ParameterStats>>,
    pub anomalies: Vec<Anomaly>,
    pub predictions: BTreeMap<Parameter, Prediction>,
    pub quality_trend: QualityTrend,
    /// `None` when the window holds too few readings
    pub correlations: Option<BTreeMap<String, CorrelationResult>>,
}

impl TrendReport {
    /// Print summary
    pub fn print_summary(&self) {
        println!("=== Trend Report ({}) ===", self.time_range);
        println!("Generated:   {}", self.timestamp);
        println!("Data points: {}", self.data_points);

        println!("\n=== Parameters ===");
        for (parameter, stats) in &self.parameters {
            match stats {
                Some(s) => println!(
                    "{:12} now {:>9.3}  mean {:>9.3}  sd {:>8.3}  {:>17}  {}",
                    parameter.name(),
                    s.current,
                    s.mean,
                    s.std_dev,
                    s.trend.direction.name(),
                    s.stability.name()
                ),
                None => println!("{:12} no data", parameter.name()),
            }
        }

        println!("\n=== Anomalies ===");
        if self.anomalies.is_empty() {
            println!("None detected");
        }
        for anomaly in &self.anomalies {
            println!("[{:?}] {}", anomaly.severity, anomaly.message);
        }

        println!("\n=== Predictions ===");
        for prediction in self.predictions.values() {
            println!(
                "{:12} {:>9.3}  ({:.3} .. {:.3}, confidence {:.0}%)",
                prediction.parameter.name(),
                prediction.predicted,
                prediction.range.lower,
                prediction.range.upper,
                prediction.confidence * 100.0
            );
        }

        println!("\n=== Quality Trend ===");
        println!("{}", self.quality_trend.message);
        if let Some(rec) = &self.quality_trend.recommendation {
            println!("[{:?}] {}", rec.priority, rec.action);
        }

        println!("\n=== Correlations ===");
        match &self.correlations {
            None => println!("Insufficient data"),
            Some(correlations) => {
                for (pair, c) in correlations {
                    println!("{:22} {:>7.3}  {:?}", pair, c.coefficient, c.strength);
                }
            }
        }
    }
}

/// Composes the analysis components into reports
#[derive(Debug, Clone)]
pub struct TrendReportBuilder {
    stats: StatisticsEngine,
    trend: TrendDetector,
    anomaly: AnomalyDetector,
    forecaster: Forecaster,
    correlation: CorrelationAnalyzer,
    parameters: Vec<Parameter>,
    alert_score: f64,
}

impl Default for TrendReportBuilder {
    fn default() -> Self {
        Self::new(
            TrendDetector::default(),
            AnomalyDetector::default(),
            Forecaster::default(),
        )
    }
}

impl TrendReportBuilder {
    /// Builder over every tracked parameter
    pub fn new(trend: TrendDetector, anomaly: AnomalyDetector, forecaster: Forecaster) -> Self {
        Self {
            stats: StatisticsEngine::new(trend),
            trend,
            anomaly,
            forecaster,
            correlation: CorrelationAnalyzer::new(),
            parameters: Parameter::ALL.to_vec(),
            alert_score: DEFAULT_ALERT_SCORE,
        }
    }

    /// Restrict the report to a subset of parameters
    pub fn with_parameters(mut self, parameters: &[Parameter]) -> Self {
        self.parameters = parameters.to_vec();
        self
    }

    /// Score below which a reading counts as a dashboard alert
    pub fn with_alert_score(mut self, alert_score: f64) -> Self {
        self.alert_score = alert_score;
        self
    }

    /// Build a report over `readings`, the contents of `window` at `now_millis`
    pub fn build(
        &self,
        window: TimeWindow,
        readings: &[StoredReading],
        now_millis: i64,
        scorer: Option<&dyn QualityScorer>,
    ) -> TrendReport {
        let mut parameters = BTreeMap::new();
        let mut anomalies = Vec::new();
        let mut predictions = BTreeMap::new();

        for &parameter in &self.parameters {
            parameters.insert(parameter, self.stats.compute(parameter, readings));

            if let Some(anomaly) = self.anomaly.detect(parameter, readings).into_anomaly() {
                anomalies.push(anomaly);
            }

            if let Some(prediction) = self.forecaster.predict(parameter, readings) {
                predictions.insert(parameter, prediction);
            }
        }

        tracing::debug!(
            "Built {} report: {} readings, {} anomalies",
            window,
            readings.len(),
            anomalies.len()
        );

        TrendReport {
            time_range: window,
            timestamp: format_millis(now_millis),
            data_points: readings.len(),
            parameters,
            anomalies,
            predictions,
            quality_trend: self.quality_trend(readings, scorer),
            correlations: self.correlations(readings),
        }
    }

    /// Trend of quality scores over `readings`
    pub fn quality_trend(
        &self,
        readings: &[StoredReading],
        scorer: Option<&dyn QualityScorer>,
    ) -> QualityTrend {
        let scores = score_readings(scorer, readings);
        QualityTrend::from_scores(&scores, &self.trend)
    }

    /// Pairwise correlations of the builder's parameters
    pub fn correlations(
        &self,
        readings: &[StoredReading],
    ) -> Option<BTreeMap<String, CorrelationResult>> {
        self.correlation.correlate_all(&self.parameters, readings)
    }

    /// Dashboard metrics over `readings`
    pub fn dashboard(
        &self,
        readings: &[StoredReading],
        scorer: Option<&dyn QualityScorer>,
    ) -> DashboardMetrics {
        DashboardMetrics::compute(readings, scorer, self.alert_score)
    }
}
