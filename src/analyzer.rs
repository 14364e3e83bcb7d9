//! Query surface over the history store and the analysis components
//!
//! [`TrendAnalyzer`] owns one [`HistoryStore`] and answers every query by
//! slicing the log and handing the slice to a pure analysis component.
//! Windowed queries measure back from the store's clock; anomaly detection,
//! forecasting, correlations and dashboard metrics use the full history.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::{
    AnomalyDetector, AnomalyResult, CorrelationResult, Forecaster, ParameterStats, Prediction,
    StatisticsEngine, TrendDetector,
};
use crate::clock::{Clock, SystemClock};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::history::{HistoryBackend, HistoryStore, JsonFileBackend, TimeWindow};
use crate::reading::{Parameter, Reading, StoredReading};
use crate::report::{DashboardMetrics, QualityScorer, QualityTrend, TrendReport, TrendReportBuilder};

/// Trend analysis engine
pub struct TrendAnalyzer {
    store: HistoryStore,
    stats: StatisticsEngine,
    builder: TrendReportBuilder,
    anomaly_threshold: f64,
    smoothing_alpha: f64,
    scorer: Option<Box<dyn QualityScorer>>,
}

impl TrendAnalyzer {
    /// Open the file-backed history named by `config`, on wall-clock time
    pub fn open(config: &AnalyzerConfig) -> Result<Self> {
        let backend = JsonFileBackend::new(&config.history_path)?;
        Ok(Self::with_backend(Box::new(backend), Arc::new(SystemClock), config))
    }

    /// Build over an explicit backend and clock
    pub fn with_backend(
        backend: Box<dyn HistoryBackend>,
        clock: Arc<dyn Clock>,
        config: &AnalyzerConfig,
    ) -> Self {
        let trend = TrendDetector::new(config.trend_window);
        let builder = TrendReportBuilder::new(
            trend,
            AnomalyDetector::new(config.anomaly_threshold),
            Forecaster::new(config.smoothing_alpha),
        )
        .with_alert_score(config.alert_score_threshold);

        Self {
            store: HistoryStore::open(backend, clock, config.max_history),
            stats: StatisticsEngine::new(trend),
            builder,
            anomaly_threshold: config.anomaly_threshold,
            smoothing_alpha: config.smoothing_alpha,
            scorer: None,
        }
    }

    /// Attach the quality-scoring collaborator
    pub fn with_scorer(mut self, scorer: impl QualityScorer + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    /// Underlying history store
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    fn scorer(&self) -> Option<&dyn QualityScorer> {
        self.scorer.as_deref()
    }

    /// Stamp and persist a reading
    pub fn store_reading(&self, reading: Reading) -> Result<StoredReading> {
        self.store
            .append(reading)
            .map_err(|e| e.with_context("Failed to store reading"))
    }

    /// Full history, oldest first
    pub fn get_history(&self) -> Vec<StoredReading> {
        self.store.get_all()
    }

    /// Drop all stored readings
    pub fn clear_history(&self) -> Result<()> {
        self.store
            .clear()
            .map_err(|e| e.with_context("Failed to clear history"))
    }

    /// Statistics for `parameter` over `window`; `None` when it has no values there
    pub fn get_parameter_stats(
        &self,
        parameter: Parameter,
        window: TimeWindow,
    ) -> Option<ParameterStats> {
        let readings = self.store.filter_by_window(window);
        self.stats.compute(parameter, &readings)
    }

    /// Check the latest value of `parameter` against the full history
    pub fn detect_anomalies(&self, parameter: Parameter, threshold: Option<f64>) -> AnomalyResult {
        let detector = AnomalyDetector::new(threshold.unwrap_or(self.anomaly_threshold));
        detector.detect(parameter, &self.store.get_all())
    }

    /// Anomaly check for every tracked parameter
    pub fn detect_all_anomalies(
        &self,
        threshold: Option<f64>,
    ) -> BTreeMap<Parameter, AnomalyResult> {
        let detector = AnomalyDetector::new(threshold.unwrap_or(self.anomaly_threshold));
        let readings = self.store.get_all();
        Parameter::ALL
            .iter()
            .map(|&p| (p, detector.detect(p, &readings)))
            .collect()
    }

    /// One-step forecast for `parameter`; `None` with fewer than five values
    pub fn predict_next_value(
        &self,
        parameter: Parameter,
        alpha: Option<f64>,
    ) -> Option<Prediction> {
        let forecaster = Forecaster::new(alpha.unwrap_or(self.smoothing_alpha));
        forecaster.predict(parameter, &self.store.get_all())
    }

    /// Forecasts for every parameter with enough history
    pub fn predict_all(&self, alpha: Option<f64>) -> BTreeMap<Parameter, Prediction> {
        let forecaster = Forecaster::new(alpha.unwrap_or(self.smoothing_alpha));
        let readings = self.store.get_all();
        Parameter::ALL
            .iter()
            .filter_map(|&p| forecaster.predict(p, &readings).map(|prediction| (p, prediction)))
            .collect()
    }

    /// Quality-score trend over `window`
    pub fn get_quality_trend(&self, window: TimeWindow) -> QualityTrend {
        let readings = self.store.filter_by_window(window);
        self.builder.quality_trend(&readings, self.scorer())
    }

    /// Pairwise correlations over the full history; `None` below twenty readings
    pub fn get_parameter_correlations(&self) -> Option<BTreeMap<String, CorrelationResult>> {
        self.builder.correlations(&self.store.get_all())
    }

    /// Full report over `window`
    pub fn generate_trend_report(&self, window: TimeWindow) -> TrendReport {
        let now = self.store.now_millis();
        let all = self.store.get_all();
        let readings = window.filter(&all, now);
        self.builder.build(window, &readings, now, self.scorer())
    }

    /// Headline metrics over the full history
    pub fn get_dashboard_metrics(&self) -> DashboardMetrics {
        self.builder.dashboard(&self.store.get_all(), self.scorer())
    }
}
