//! Model artifact and training data locations.

use crate::infrastructure::persistence::training_data::TrainingDataFormat;
use anyhow::Result;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/match_model.json";
pub const DEFAULT_TRAINING_DATA_PATH: &str = "data/matches.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub model_path: PathBuf,
    pub training_data_path: PathBuf,
    pub training_data_format: TrainingDataFormat,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            training_data_path: PathBuf::from(DEFAULT_TRAINING_DATA_PATH),
            training_data_format: TrainingDataFormat::Csv,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let model_path = PathBuf::from(
            env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string()),
        );
        let training_data_path = PathBuf::from(
            env::var("TRAINING_DATA_PATH")
                .unwrap_or_else(|_| DEFAULT_TRAINING_DATA_PATH.to_string()),
        );
        // Unset means "guess from the extension"
        let training_data_format = match env::var("TRAINING_DATA_FORMAT") {
            Ok(s) if !s.trim().is_empty() => s.parse::<TrainingDataFormat>()?,
            _ => TrainingDataFormat::infer(&training_data_path),
        };

        Ok(Self {
            model_path,
            training_data_path,
            training_data_format,
        })
    }
}
