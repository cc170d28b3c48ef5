use super::backend::{BackendSettings, ClassifierBackend, ClassifierParams, distinct_labels};
use super::evaluation::{EvaluationReport, EvaluationSet};
use super::model::{Model, ModelMetadata};
use super::scaler::StandardScaler;
use crate::domain::errors::PredictionError;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::TrainingExample;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    /// Share of samples held out for evaluation, in `[0, 1)`
    pub test_ratio: f64,
    pub cv_folds: usize,
    pub backend: BackendSettings,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_ratio: 0.2,
            cv_folds: 5,
            backend: BackendSettings::default(),
        }
    }
}

/// A trained model and how well it did.
#[derive(Debug)]
pub struct TrainingRun {
    pub model: Model,
    pub report: EvaluationReport,
}

/// Fits the standardize-then-classify pipeline and evaluates it.
pub struct ModelTrainer {
    config: TrainingConfig,
    backend: Arc<dyn ClassifierBackend>,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        let backend = config.backend.build();
        Self { config, backend }
    }

    /// Uses a custom backend; `config.backend` is ignored.
    pub fn with_backend(config: TrainingConfig, backend: Arc<dyn ClassifierBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn train(&self, examples: &[TrainingExample]) -> Result<TrainingRun, PredictionError> {
        self.train_observed(examples, || {})
    }

    /// Like `train`, calling `on_evaluate` once the final fit is done and
    /// evaluation starts.
    pub fn train_observed<F: FnOnce()>(
        &self,
        examples: &[TrainingExample],
        on_evaluate: F,
    ) -> Result<TrainingRun, PredictionError> {
        let labels: Vec<MatchOutcome> = examples.iter().map(|e| e.outcome).collect();
        let distinct = distinct_labels(&labels);
        if distinct < 2 {
            return Err(PredictionError::InsufficientTrainingData {
                samples: examples.len(),
                distinct_labels: distinct,
            });
        }

        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        order.shuffle(&mut rng);

        let rows: Vec<Vec<f64>> = order.iter().map(|&i| examples[i].features.to_vec()).collect();
        let labels: Vec<MatchOutcome> = order.iter().map(|&i| examples[i].outcome).collect();

        let test_size = self.test_size(rows.len());
        let hold_out_usable = test_size > 0
            && test_size < rows.len()
            && distinct_labels(&labels[test_size..]) >= 2;

        let (train_rows, train_labels, eval_rows, eval_labels, evaluated_on) = if hold_out_usable {
            (
                &rows[test_size..],
                &labels[test_size..],
                &rows[..test_size],
                &labels[..test_size],
                EvaluationSet::HoldOut,
            )
        } else {
            warn!(
                "Hold-out split unusable for {} samples (test size {}), evaluating on training data",
                rows.len(),
                test_size
            );
            (&rows[..], &labels[..], &rows[..], &labels[..], EvaluationSet::TrainingData)
        };

        info!(
            "Training {} on {} samples ({} for evaluation)",
            self.backend.name(),
            train_rows.len(),
            eval_rows.len()
        );
        let (scaler, classifier) = self.fit_pipeline(train_rows, train_labels)?;
        on_evaluate();

        let predicted = predict_labels(&scaler, &classifier, eval_rows)?;
        let cross_val_scores = self.cross_validate(train_rows, train_labels)?;
        let report = EvaluationReport::new(eval_labels, &predicted, cross_val_scores, evaluated_on);

        info!(
            "Training complete: accuracy {:.4}, cv mean {}",
            report.accuracy(),
            report
                .cross_val_mean
                .map(|m| format!("{:.4}", m))
                .unwrap_or_else(|| "n/a".to_string())
        );

        let metadata =
            ModelMetadata::new(classifier.kind(), train_rows.len(), self.config.seed);
        Ok(TrainingRun {
            model: Model::new(metadata, scaler, classifier),
            report,
        })
    }

    fn test_size(&self, n: usize) -> usize {
        let ratio = self.config.test_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            return 0;
        }
        ((n as f64 * ratio).ceil() as usize).min(n)
    }

    fn fit_pipeline(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<(StandardScaler, ClassifierParams), PredictionError> {
        let scaler = StandardScaler::fit(rows)?;
        let scaled = scaler.transform_all(rows)?;
        let classifier = self.backend.fit(&scaled, labels)?;
        Ok((scaler, classifier))
    }

    /// Accuracy of each scorable fold, in fold order.
    ///
    /// Folds fit concurrently, and each SVM fold holds a dense kernel over its
    /// training part, so peak memory is roughly `folds * n²` floats. Cap the
    /// fold count or `RAYON_NUM_THREADS` for datasets well past a few
    /// thousand matches.
    fn cross_validate(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<Vec<f64>, PredictionError> {
        let folds = self.config.cv_folds.min(rows.len());
        if folds < 2 {
            return Ok(Vec::new());
        }
        let n = rows.len();

        let scores: Vec<Option<f64>> = (0..folds)
            .into_par_iter()
            .map(|k| -> Result<Option<f64>, PredictionError> {
                let (start, end) = (k * n / folds, (k + 1) * n / folds);
                let mut fold_rows = Vec::with_capacity(n - (end - start));
                let mut fold_labels = Vec::with_capacity(n - (end - start));
                for i in (0..start).chain(end..n) {
                    fold_rows.push(rows[i].clone());
                    fold_labels.push(labels[i]);
                }
                if start == end || distinct_labels(&fold_labels) < 2 {
                    debug!("Skipping CV fold {}: not enough labels", k);
                    return Ok(None);
                }

                let (scaler, classifier) = self.fit_pipeline(&fold_rows, &fold_labels)?;
                let predicted = predict_labels(&scaler, &classifier, &rows[start..end])?;
                let correct = predicted
                    .iter()
                    .zip(labels[start..end].iter())
                    .filter(|(p, t)| p == t)
                    .count();
                Ok(Some(correct as f64 / (end - start) as f64))
            })
            .collect::<Result<_, _>>()?;

        Ok(scores.into_iter().flatten().collect())
    }
}

fn predict_labels(
    scaler: &StandardScaler,
    classifier: &ClassifierParams,
    rows: &[Vec<f64>],
) -> Result<Vec<MatchOutcome>, PredictionError> {
    let scaled = scaler.transform_all(rows)?;
    Ok(classifier
        .predict_proba_batch(&scaled)?
        .iter()
        .map(|p| p.most_likely())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::backend::BackendKind;
    use crate::domain::ml::feature_registry::FEATURE_COUNT;
    use crate::domain::ml::types::FeatureVector;

    /// Home-heavy stats win, away-heavy lose, balanced draw.
    fn synthetic(n_per_class: usize) -> Vec<TrainingExample> {
        let mut out = Vec::new();
        for i in 0..n_per_class {
            let wobble = (i % 7) as f64 * 0.1;
            for (outcome, home, away) in [
                (MatchOutcome::HomeWin, 8.0, 2.0),
                (MatchOutcome::AwayWin, 2.0, 8.0),
                (MatchOutcome::Draw, 5.0, 5.0),
            ] {
                let mut values = [0.0; FEATURE_COUNT];
                for (j, v) in values.iter_mut().enumerate() {
                    let base = if j < FEATURE_COUNT / 2 { home } else { away };
                    *v = base + wobble + j as f64 * 0.01;
                }
                out.push(TrainingExample::new(FeatureVector::from_values(values), outcome));
            }
        }
        out
    }

    #[test]
    fn test_single_label_is_insufficient() {
        let examples: Vec<_> = synthetic(5)
            .into_iter()
            .filter(|e| e.outcome == MatchOutcome::Draw)
            .collect();
        let result = ModelTrainer::new(TrainingConfig::default()).train(&examples);
        assert!(matches!(
            result,
            Err(PredictionError::InsufficientTrainingData {
                samples: 5,
                distinct_labels: 1
            })
        ));
    }

    #[test]
    fn test_empty_set_is_insufficient() {
        assert!(matches!(
            ModelTrainer::new(TrainingConfig::default()).train(&[]),
            Err(PredictionError::InsufficientTrainingData { samples: 0, .. })
        ));
    }

    #[test]
    fn test_trains_and_evaluates_on_hold_out() {
        let examples = synthetic(20);
        let run = ModelTrainer::new(TrainingConfig::default())
            .train(&examples)
            .unwrap();

        assert_eq!(run.report.evaluated_on, EvaluationSet::HoldOut);
        assert_eq!(run.report.evaluation_samples, 12);
        assert_eq!(run.model.metadata.training_samples, 48);
        assert_eq!(run.report.cross_val_scores.len(), 5);
        assert!(run.report.accuracy() > 0.9);
        assert!(run.report.cross_val_mean.unwrap() > 0.9);
        assert!(run.model.check_schema().is_ok());
    }

    #[test]
    fn test_tiny_set_falls_back_to_training_data() {
        let examples = synthetic(1)[..2].to_vec();
        let run = ModelTrainer::new(TrainingConfig::default())
            .train(&examples)
            .unwrap();
        assert_eq!(run.report.evaluated_on, EvaluationSet::TrainingData);
        assert_eq!(run.report.evaluation_samples, 2);
        assert_eq!(run.report.cross_val_mean, None);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let examples = synthetic(10);
        let trainer = ModelTrainer::new(TrainingConfig::default());
        let a = trainer.train(&examples).unwrap();
        let b = trainer.train(&examples).unwrap();

        for e in &examples {
            assert_eq!(
                a.model.predict(&e.features).unwrap(),
                b.model.predict(&e.features).unwrap()
            );
        }
        assert_eq!(a.report.confusion_matrix, b.report.confusion_matrix);
    }

    #[test]
    fn test_random_forest_backend() {
        let config = TrainingConfig {
            backend: BackendSettings {
                kind: BackendKind::RandomForest,
                ..Default::default()
            },
            cv_folds: 3,
            ..Default::default()
        };
        let trainer = ModelTrainer::new(config);
        assert_eq!(trainer.backend_name(), "random_forest");

        let run = trainer.train(&synthetic(15)).unwrap();
        assert_eq!(run.model.metadata.backend, BackendKind::RandomForest);
        assert_eq!(run.report.cross_val_scores.len(), 3);
        assert!(run.report.accuracy() > 0.8);
    }
}
