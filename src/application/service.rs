use crate::application::ml::predictor::{ActiveModel, Predictor};
use crate::application::ml::retrain::{RetrainOrchestrator, RetrainOutcome};
use crate::application::ml::trainer::ModelTrainer;
use crate::config::Config;
use crate::domain::errors::PredictionError;
use crate::domain::ml::types::Prediction;
use crate::domain::ports::TrainingDataSource;
use crate::domain::validation::FeatureValidator;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::model_store::ModelStore;
use crate::interfaces::api::{PredictRequest, PredictResponse, RetrainResponse, StatusResponse};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Request-level entry point: validation, prediction and retraining.
pub struct PredictionService {
    predictor: Predictor,
    orchestrator: RetrainOrchestrator,
    metrics: Metrics,
}

impl PredictionService {
    pub fn new(
        source: Arc<dyn TrainingDataSource>,
        trainer: ModelTrainer,
        store: ModelStore,
        metrics: Metrics,
    ) -> Self {
        let active = Arc::new(ActiveModel::new());
        let predictor = Predictor::new(Arc::clone(&active), store.clone());
        let orchestrator =
            RetrainOrchestrator::new(source, trainer, store, active, metrics.clone());
        Self {
            predictor,
            orchestrator,
            metrics,
        }
    }

    /// Wires everything from configuration and loads the stored model if
    /// there is one.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let service = Self::new(
            config.training_source(),
            ModelTrainer::new(config.to_training_config()),
            config.model_store(),
            Metrics::new()?,
        );
        service.try_load();
        Ok(service)
    }

    /// Loads the stored model, logging instead of failing when absent.
    pub fn try_load(&self) -> bool {
        match self.predictor.reload() {
            Ok(_) => true,
            Err(e) => {
                warn!("Starting without a model: {}", e);
                false
            }
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn orchestrator(&self) -> &RetrainOrchestrator {
        &self.orchestrator
    }

    /// Validates `features` and classifies them with the active model.
    pub fn predict(&self, features: &Value) -> Result<Prediction, PredictionError> {
        let result = FeatureValidator::validate_value(features)
            .map_err(PredictionError::from)
            .and_then(|vector| self.predictor.predict(&vector));

        match &result {
            Ok(p) => self.metrics.inc_predictions(p.outcome.token()),
            Err(e) => self.metrics.inc_errors(e.code()),
        }
        result
    }

    /// Handles a full request body `{ "features": { ... } }`.
    pub fn predict_json(&self, body: &Value) -> Result<PredictResponse, PredictionError> {
        let features = match serde_json::from_value::<PredictRequest>(body.clone()) {
            Ok(req) => req.features,
            Err(_) => Value::Null,
        };
        self.predict(&features).map(PredictResponse::from)
    }

    pub async fn retrain(&self) -> Result<RetrainOutcome, PredictionError> {
        let result = self.orchestrator.retrain().await;
        if let Err(e) = &result {
            self.metrics.inc_errors(e.code());
        }
        result
    }

    pub async fn retrain_json(&self) -> Result<RetrainResponse, PredictionError> {
        let outcome = self.retrain().await?;
        info!("Retrain produced model {}", outcome.handle.model_id);
        Ok(RetrainResponse::from(&outcome))
    }

    pub fn status(&self) -> StatusResponse {
        let model = self.predictor.active().snapshot();
        StatusResponse {
            model_loaded: model.is_some(),
            model_id: model.as_ref().map(|m| m.id()),
            backend: model.as_ref().map(|m| m.metadata.backend.as_str().to_string()),
            trained_at: model.as_ref().map(|m| m.metadata.trained_at),
            training_samples: model.as_ref().map(|m| m.metadata.training_samples),
            retrain_state: self.orchestrator.state(),
            last_retrain_failure: self.orchestrator.last_failure(),
        }
    }
}
