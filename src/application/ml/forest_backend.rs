use super::backend::{ClassifierBackend, ClassifierParams, check_training_set};
use crate::domain::errors::PredictionError;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::ClassProbabilities;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    pub n_trees: u16,
    pub max_depth: u16,
    pub min_split: usize,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_split: 5,
        }
    }
}

/// Random forest classifier backed by smartcore.
///
/// The forest votes a single class, so probabilities are one-hot.
pub struct RandomForestBackend {
    settings: ForestSettings,
}

impl RandomForestBackend {
    pub fn new(settings: ForestSettings) -> Self {
        Self { settings }
    }
}

impl ClassifierBackend for RandomForestBackend {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<ClassifierParams, PredictionError> {
        check_training_set(rows, labels)?;

        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| PredictionError::training(format!("Matrix creation failed: {}", e)))?;
        let y: Vec<u32> = labels.iter().map(|l| l.index() as u32).collect();

        let params = RandomForestClassifierParameters::default()
            .with_n_trees(self.settings.n_trees.into())
            .with_max_depth(self.settings.max_depth)
            .with_min_samples_split(self.settings.min_split);

        debug!(
            "Fitting random forest: {} samples, {} trees, depth {}",
            rows.len(),
            self.settings.n_trees,
            self.settings.max_depth
        );
        let model = Forest::fit(&x, &y, params)
            .map_err(|e| PredictionError::training(format!("Forest fit failed: {}", e)))?;

        Ok(ClassifierParams::RandomForest(ForestParams { model }))
    }
}

#[derive(Serialize, Deserialize)]
pub struct ForestParams {
    model: Forest,
}

impl ForestParams {
    pub fn predict_proba_batch(
        &self,
        rows: &[Vec<f64>],
    ) -> Result<Vec<ClassProbabilities>, PredictionError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| PredictionError::training(format!("Matrix creation failed: {}", e)))?;
        let votes = self
            .model
            .predict(&x)
            .map_err(|e| PredictionError::training(format!("Forest prediction failed: {}", e)))?;

        votes
            .into_iter()
            .map(|class| {
                MatchOutcome::from_index(class as usize)
                    .map(ClassProbabilities::certain)
                    .ok_or_else(|| {
                        PredictionError::model_unavailable(format!("Unknown class index {}", class))
                    })
            })
            .collect()
    }
}
