use super::model::Model;
use crate::domain::errors::PredictionError;
use crate::domain::ml::types::{FeatureVector, Prediction};
use crate::infrastructure::persistence::model_store::ModelStore;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Process-wide slot holding the model predictions run against.
///
/// Readers take an `Arc` snapshot and drop the lock before computing, so a
/// swap never waits on an in-flight prediction.
#[derive(Default)]
pub struct ActiveModel {
    slot: RwLock<Option<Arc<Model>>>,
}

impl fmt::Debug for ActiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveModel")
            .field("model_id", &self.snapshot().map(|m| m.id()))
            .finish()
    }
}

impl ActiveModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Model) -> Self {
        Self {
            slot: RwLock::new(Some(Arc::new(model))),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<Model>> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Installs `model`, returning the one it replaced.
    pub fn swap(&self, model: Arc<Model>) -> Option<Arc<Model>> {
        match self.slot.write() {
            Ok(mut guard) => guard.replace(model),
            Err(poisoned) => poisoned.into_inner().replace(model),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }
}

/// Classifies validated feature vectors with the active model.
#[derive(Debug, Clone)]
pub struct Predictor {
    active: Arc<ActiveModel>,
    store: ModelStore,
}

impl Predictor {
    pub fn new(active: Arc<ActiveModel>, store: ModelStore) -> Self {
        Self { active, store }
    }

    pub fn active(&self) -> &Arc<ActiveModel> {
        &self.active
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError> {
        let model = self
            .active
            .snapshot()
            .ok_or_else(|| PredictionError::model_unavailable("No trained model is loaded"))?;
        model.predict(features)
    }

    /// Replaces the active model with the store's current artifact.
    pub fn reload(&self) -> Result<Arc<Model>, PredictionError> {
        let model = Arc::new(self.store.load_active()?);
        self.active.swap(Arc::clone(&model));
        info!("Active model is now {}", model.id());
        Ok(model)
    }
}
