//! Prometheus metrics definitions for matchcast
//!
//! All metrics use the `matchcast_` prefix.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for prediction and retraining
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Predictions served, by predicted outcome
    pub predictions_total: CounterVec,
    /// Failed requests, by error code
    pub prediction_errors_total: CounterVec,
    /// Retrain attempts, by result
    pub retrains_total: CounterVec,
    /// Wall time of a retrain in seconds
    pub retrain_duration_seconds: HistogramVec,
    /// Cross-validation accuracy of the active model (0-1)
    pub model_cv_accuracy: GenericGauge<AtomicF64>,
    /// Hold-out accuracy of the active model (0-1)
    pub model_accuracy: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("matchcast_predictions_total", "Predictions served by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_errors_total = CounterVec::new(
            Opts::new(
                "matchcast_prediction_errors_total",
                "Failed requests by error code",
            ),
            &["code"],
        )?;
        registry.register(Box::new(prediction_errors_total.clone()))?;

        let retrains_total = CounterVec::new(
            Opts::new("matchcast_retrains_total", "Retrain attempts by result"),
            &["result"],
        )?;
        registry.register(Box::new(retrains_total.clone()))?;

        let retrain_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "matchcast_retrain_duration_seconds",
                "Retrain wall time in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            &["backend"],
        )?;
        registry.register(Box::new(retrain_duration_seconds.clone()))?;

        let model_cv_accuracy = Gauge::with_opts(Opts::new(
            "matchcast_model_cv_accuracy",
            "Cross-validation accuracy of the active model (0-1)",
        ))?;
        registry.register(Box::new(model_cv_accuracy.clone()))?;

        let model_accuracy = Gauge::with_opts(Opts::new(
            "matchcast_model_accuracy",
            "Evaluation accuracy of the active model (0-1)",
        ))?;
        registry.register(Box::new(model_accuracy.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            prediction_errors_total,
            retrains_total,
            retrain_duration_seconds,
            model_cv_accuracy,
            model_accuracy,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_errors(&self, code: &str) {
        self.prediction_errors_total
            .with_label_values(&[code])
            .inc();
    }

    pub fn inc_retrains(&self, result: &str) {
        self.retrains_total.with_label_values(&[result]).inc();
    }

    pub fn observe_retrain(&self, backend: &str, seconds: f64) {
        self.retrain_duration_seconds
            .with_label_values(&[backend])
            .observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.model_cv_accuracy.set(0.5);
        assert!(metrics.render().contains("matchcast_"));
    }

    #[test]
    fn test_prediction_counter_by_outcome() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_predictions("HomeWin");
        metrics.inc_predictions("HomeWin");
        metrics.inc_predictions("Draw");
        let output = metrics.render();
        assert!(output.contains("matchcast_predictions_total{outcome=\"HomeWin\"} 2"));
        assert!(output.contains("matchcast_predictions_total{outcome=\"Draw\"} 1"));
    }

    #[test]
    fn test_retrain_metrics() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_retrains("success");
        metrics.observe_retrain("rbf_svm", 1.5);
        metrics.model_cv_accuracy.set(0.75);
        let output = metrics.render();
        assert!(output.contains("matchcast_retrains_total{result=\"success\"} 1"));
        assert!(output.contains("matchcast_retrain_duration_seconds"));
        assert!(output.contains("matchcast_model_cv_accuracy 0.75"));
    }
}
