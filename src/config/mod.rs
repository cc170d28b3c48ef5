//! Configuration module for matchcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Model locations, Training, and Observability.

mod model_config;
mod observability_config;
mod training_config;

pub use model_config::{DEFAULT_MODEL_PATH, DEFAULT_TRAINING_DATA_PATH, ModelEnvConfig};
pub use observability_config::ObservabilityEnvConfig;
pub use training_config::TrainingEnvConfig;

use crate::application::ml::backend::BackendSettings;
use crate::application::ml::dataset_builder::{DatasetBuilder, MissingStatsPolicy};
use crate::application::ml::trainer::TrainingConfig;
use crate::domain::ports::TrainingDataSource;
use crate::infrastructure::persistence::model_store::ModelStore;
use crate::infrastructure::persistence::training_data::{TrainingDataFormat, open_training_source};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Main application configuration.
///
/// This struct aggregates all configuration from sub-modules.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Model (from ModelEnvConfig)
    pub model_path: PathBuf,
    pub training_data_path: PathBuf,
    pub training_data_format: TrainingDataFormat,

    // Training (from TrainingEnvConfig)
    pub seed: u64,
    pub test_ratio: f64,
    pub cv_folds: usize,
    pub backend: BackendSettings,
    pub missing_stats_policy: MissingStatsPolicy,

    // Observability (from ObservabilityEnvConfig)
    pub observability_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        let model = ModelEnvConfig::default();
        let training = TrainingConfig::default();
        Self {
            model_path: model.model_path,
            training_data_path: model.training_data_path,
            training_data_format: model.training_data_format,
            seed: training.seed,
            test_ratio: training.test_ratio,
            cv_folds: training.cv_folds,
            backend: training.backend,
            missing_stats_policy: MissingStatsPolicy::default(),
            observability_enabled: ObservabilityEnvConfig::default().enabled,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Callers load `.env` first (`dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self> {
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let training = TrainingEnvConfig::from_env().context("Failed to load training config")?;
        let observability = ObservabilityEnvConfig::from_env();

        Ok(Self {
            model_path: model.model_path,
            training_data_path: model.training_data_path,
            training_data_format: model.training_data_format,

            seed: training.seed,
            test_ratio: training.test_ratio,
            cv_folds: training.cv_folds,
            backend: training.backend,
            missing_stats_policy: training.missing_stats_policy,

            observability_enabled: observability.enabled,
        })
    }

    pub fn to_training_config(&self) -> TrainingConfig {
        TrainingConfig {
            seed: self.seed,
            test_ratio: self.test_ratio,
            cv_folds: self.cv_folds,
            backend: self.backend,
        }
    }

    pub fn dataset_builder(&self) -> DatasetBuilder {
        DatasetBuilder::new(self.missing_stats_policy)
    }

    pub fn model_store(&self) -> ModelStore {
        ModelStore::new(self.model_path.clone())
    }

    pub fn training_source(&self) -> Arc<dyn TrainingDataSource> {
        open_training_source(
            self.training_data_path.clone(),
            self.training_data_format,
            self.dataset_builder(),
        )
    }
}
