//! Training pipeline configuration parsing from environment variables.
//!
//! Covers the split and cross-validation settings, the classifier backend
//! with its hyperparameters, and the missing-statistics policy.

use crate::application::ml::backend::{BackendKind, BackendSettings};
use crate::application::ml::dataset_builder::MissingStatsPolicy;
use crate::application::ml::forest_backend::ForestSettings;
use crate::application::ml::svm_backend::SvmSettings;
use crate::application::ml::trainer::TrainingConfig;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub seed: u64,
    pub test_ratio: f64,
    pub cv_folds: usize,
    pub backend: BackendSettings,
    pub missing_stats_policy: MissingStatsPolicy,
}

impl TrainingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let seed = Self::parse("TRAINING_SEED", 42u64)?;

        let test_ratio = Self::parse("TRAINING_TEST_RATIO", 0.2f64)?;
        if !(0.0..1.0).contains(&test_ratio) {
            anyhow::bail!(
                "TRAINING_TEST_RATIO must be in [0, 1), got {}",
                test_ratio
            );
        }

        let cv_folds = Self::parse("TRAINING_CV_FOLDS", 5usize)?;

        let kind = BackendKind::from_str(
            &env::var("CLASSIFIER_BACKEND").unwrap_or_else(|_| "svm".to_string()),
        )?;

        let svm = SvmSettings {
            c: Self::parse("SVM_C", 1.0f64)?,
            gamma: match env::var("SVM_GAMMA") {
                Ok(s) if !s.trim().is_empty() => {
                    Some(s.trim().parse::<f64>().context("Failed to parse SVM_GAMMA")?)
                }
                _ => None,
            },
        };
        if svm.c <= 0.0 {
            anyhow::bail!("SVM_C must be positive, got {}", svm.c);
        }
        if let Some(g) = svm.gamma.filter(|g| *g <= 0.0) {
            anyhow::bail!("SVM_GAMMA must be positive, got {}", g);
        }

        let forest = ForestSettings {
            n_trees: Self::parse("FOREST_N_TREES", 100u16)?,
            max_depth: Self::parse("FOREST_MAX_DEPTH", 10u16)?,
            min_split: Self::parse("FOREST_MIN_SPLIT", 5usize)?,
        };

        let missing_stats_policy = MissingStatsPolicy::from_str(
            &env::var("MISSING_STATS_POLICY").unwrap_or_else(|_| "zero".to_string()),
        )?;

        Ok(Self {
            seed,
            test_ratio,
            cv_folds,
            backend: BackendSettings { kind, svm, forest },
            missing_stats_policy,
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

    fn parse<T>(key: &str, default: T) -> Result<T>
    where
        T: FromStr + ToString,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key))
    }
}
