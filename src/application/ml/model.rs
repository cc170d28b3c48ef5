use super::backend::{BackendKind, ClassifierParams};
use super::scaler::StandardScaler;
use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, matches_schema};
use crate::domain::ml::types::{ClassProbabilities, FeatureVector, Prediction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub backend: BackendKind,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub seed: u64,
    /// Feature order the model was trained with
    pub feature_names: Vec<String>,
}

impl ModelMetadata {
    pub fn new(backend: BackendKind, training_samples: usize, seed: u64) -> Self {
        Self {
            model_id: Uuid::new_v4(),
            backend,
            trained_at: Utc::now(),
            training_samples,
            seed,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A fitted scaler plus classifier. Immutable once built.
#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    pub metadata: ModelMetadata,
    scaler: StandardScaler,
    classifier: ClassifierParams,
}

impl Model {
    pub fn new(
        metadata: ModelMetadata,
        scaler: StandardScaler,
        classifier: ClassifierParams,
    ) -> Self {
        Self {
            metadata,
            scaler,
            classifier,
        }
    }

    pub fn id(&self) -> Uuid {
        self.metadata.model_id
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &ClassifierParams {
        &self.classifier
    }

    /// Rejects artifacts trained against a different feature schema.
    pub fn check_schema(&self) -> Result<(), PredictionError> {
        if !matches_schema(&self.metadata.feature_names) {
            return Err(PredictionError::model_unavailable(format!(
                "Model {} was trained on a different feature schema",
                self.metadata.model_id
            )));
        }
        if self.scaler.n_features() != FEATURE_NAMES.len() {
            return Err(PredictionError::model_unavailable(format!(
                "Model {} scaler expects {} features",
                self.metadata.model_id,
                self.scaler.n_features()
            )));
        }
        if self.classifier.kind() != self.metadata.backend {
            return Err(PredictionError::model_unavailable(format!(
                "Model {} metadata names backend {:?} but holds {:?}",
                self.metadata.model_id,
                self.metadata.backend,
                self.classifier.kind()
            )));
        }
        Ok(())
    }

    pub fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, PredictionError> {
        let scaled = self.scaler.transform(features.as_slice())?;
        self.classifier.predict_proba(&scaled)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError> {
        self.predict_proba(features).map(Prediction::from)
    }

    /// Predicts raw, unscaled rows in one pass.
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Prediction>, PredictionError> {
        let scaled = self.scaler.transform_all(rows)?;
        Ok(self
            .classifier
            .predict_proba_batch(&scaled)?
            .into_iter()
            .map(Prediction::from)
            .collect())
    }
}
