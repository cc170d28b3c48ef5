use std::fmt;
use thiserror::Error;

/// Problems found while validating a submitted feature map.
///
/// Both lists are always complete: validation never stops at the first
/// problem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureValidationError {
    /// Schema names absent from the input, in schema order
    pub missing: Vec<String>,
    /// Schema names present but not a finite number, in schema order
    pub invalid_type: Vec<String>,
}

impl FeatureValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid_type.is_empty()
    }
}

impl fmt::Display for FeatureValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("Missing features: {}", self.missing.join(", ")));
        }
        if !self.invalid_type.is_empty() {
            parts.push(format!(
                "Features must be finite numbers: {}",
                self.invalid_type.join(", ")
            ));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FeatureValidationError {}

/// Errors surfaced by the prediction and retraining core.
///
/// Every variant is recoverable at the request boundary.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] FeatureValidationError),

    #[error(
        "Insufficient training data: {samples} samples with {distinct_labels} distinct label(s), need at least 2 labels"
    )]
    InsufficientTrainingData {
        samples: usize,
        distinct_labels: usize,
    },

    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("A retrain is already in progress (state: {state})")]
    RetrainInProgress { state: String },

    #[error("Model persistence failed: {reason}")]
    PersistenceFailure { reason: String },

    #[error("Classifier training failed: {reason}")]
    TrainingFailed { reason: String },

    #[error("Training data could not be loaded: {reason}")]
    DataSourceFailure { reason: String },
}

impl PredictionError {
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            reason: reason.into(),
        }
    }

    pub fn training(reason: impl Into<String>) -> Self {
        Self::TrainingFailed {
            reason: reason.into(),
        }
    }

    /// Stable error code for API responses and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(v) if !v.missing.is_empty() => "MissingFeatures",
            Self::Validation(_) => "InvalidFeatureType",
            Self::InsufficientTrainingData { .. } => "InsufficientTrainingData",
            Self::ModelUnavailable { .. } => "ModelUnavailable",
            Self::RetrainInProgress { .. } => "RetrainInProgress",
            Self::PersistenceFailure { .. } => "PersistenceFailure",
            Self::TrainingFailed { .. } => "TrainingFailed",
            Self::DataSourceFailure { .. } => "DataSourceFailure",
        }
    }

    /// True for failures caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::RetrainInProgress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_formatting() {
        let error = FeatureValidationError {
            missing: vec!["home_totalShots".to_string()],
            invalid_type: vec!["away_expectedGoals".to_string()],
        };

        let msg = error.to_string();
        assert!(msg.contains("Missing features: home_totalShots"));
        assert!(msg.contains("finite numbers: away_expectedGoals"));
    }

    #[test]
    fn test_error_codes() {
        let missing = PredictionError::from(FeatureValidationError {
            missing: vec!["home_totalShots".to_string()],
            invalid_type: vec!["away_expectedGoals".to_string()],
        });
        assert_eq!(missing.code(), "MissingFeatures");

        let invalid = PredictionError::from(FeatureValidationError {
            missing: vec![],
            invalid_type: vec!["away_expectedGoals".to_string()],
        });
        assert_eq!(invalid.code(), "InvalidFeatureType");
        assert!(invalid.is_client_error());

        let unavailable = PredictionError::model_unavailable("no artifact");
        assert_eq!(unavailable.code(), "ModelUnavailable");
        assert!(!unavailable.is_client_error());
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let error = PredictionError::InsufficientTrainingData {
            samples: 12,
            distinct_labels: 1,
        };
        let msg = error.to_string();
        assert!(msg.contains("12 samples"));
        assert!(msg.contains("1 distinct"));
    }
}
