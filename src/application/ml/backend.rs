use super::forest_backend::{ForestParams, ForestSettings, RandomForestBackend};
use super::svm_backend::{RbfSvmBackend, SvmParams, SvmSettings};
use crate::domain::errors::PredictionError;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::ClassProbabilities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Interface for classifier algorithms.
///
/// A backend turns standardized feature rows into persisted parameters.
/// Prediction runs on the parameters alone, so a stored model never needs
/// the backend object that produced it.
pub trait ClassifierBackend: Send + Sync {
    /// Short algorithm name, recorded in model metadata
    fn name(&self) -> &str;

    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<ClassifierParams, PredictionError>;
}

/// Learned parameters of any supported classifier.
#[derive(Serialize, Deserialize)]
pub enum ClassifierParams {
    RbfSvm(SvmParams),
    RandomForest(ForestParams),
}

impl ClassifierParams {
    pub fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, PredictionError> {
        match self {
            ClassifierParams::RbfSvm(p) => p.predict_proba(row),
            ClassifierParams::RandomForest(p) => {
                let mut out = p.predict_proba_batch(&[row.to_vec()])?;
                out.pop()
                    .ok_or_else(|| PredictionError::training("No prediction returned"))
            }
        }
    }

    pub fn predict_proba_batch(
        &self,
        rows: &[Vec<f64>],
    ) -> Result<Vec<ClassProbabilities>, PredictionError> {
        match self {
            ClassifierParams::RbfSvm(p) => rows.iter().map(|r| p.predict_proba(r)).collect(),
            ClassifierParams::RandomForest(p) => p.predict_proba_batch(rows),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            ClassifierParams::RbfSvm(_) => BackendKind::Svm,
            ClassifierParams::RandomForest(_) => BackendKind::RandomForest,
        }
    }
}

impl fmt::Debug for ClassifierParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierParams::RbfSvm(p) => f.debug_tuple("RbfSvm").field(p).finish(),
            ClassifierParams::RandomForest(_) => f.write_str("RandomForest(<forest>)"),
        }
    }
}

/// Available classifier algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Svm,
    RandomForest,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Svm => "svm",
            BackendKind::RandomForest => "random_forest",
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svm" | "rbf_svm" | "svc" => Ok(BackendKind::Svm),
            "random_forest" | "randomforest" | "forest" | "rf" => Ok(BackendKind::RandomForest),
            _ => anyhow::bail!(
                "Invalid CLASSIFIER_BACKEND: {}. Must be 'svm' or 'random_forest'",
                s
            ),
        }
    }
}

/// Backend choice plus the hyperparameters of every algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default)]
    pub svm: SvmSettings,
    #[serde(default)]
    pub forest: ForestSettings,
}

impl BackendSettings {
    pub fn build(&self) -> Arc<dyn ClassifierBackend> {
        match self.kind {
            BackendKind::Svm => Arc::new(RbfSvmBackend::new(self.svm)),
            BackendKind::RandomForest => Arc::new(RandomForestBackend::new(self.forest)),
        }
    }
}

/// Number of distinct outcomes among `labels`.
pub fn distinct_labels(labels: &[MatchOutcome]) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}

/// Shared precondition of every backend.
pub(crate) fn check_training_set(
    rows: &[Vec<f64>],
    labels: &[MatchOutcome],
) -> Result<usize, PredictionError> {
    if rows.len() != labels.len() {
        return Err(PredictionError::training(format!(
            "{} feature rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    let distinct = distinct_labels(labels);
    if distinct < 2 {
        return Err(PredictionError::InsufficientTrainingData {
            samples: rows.len(),
            distinct_labels: distinct,
        });
    }
    let width = rows[0].len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return Err(PredictionError::training("Inconsistent feature row widths"));
    }
    Ok(width)
}
