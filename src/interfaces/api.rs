//! JSON request and response bodies of the prediction service.

use crate::application::ml::evaluation::{ClassificationReport, ConfusionMatrix};
use crate::application::ml::retrain::{RetrainOutcome, RetrainState};
use crate::domain::errors::PredictionError;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::{ClassProbabilities, Prediction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// `{ "features": { <feature name>: number, ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub features: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: MatchOutcome,
    pub probabilities: ClassProbabilities,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        Self {
            prediction: p.outcome,
            probabilities: p.probabilities,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrainResponse {
    pub message: String,
    pub model_id: Uuid,
    pub classification_report: ClassificationReport,
    pub confusion_matrix: ConfusionMatrix,
    pub cross_val_mean: Option<f64>,
    pub duration_ms: u128,
}

impl From<&RetrainOutcome> for RetrainResponse {
    fn from(outcome: &RetrainOutcome) -> Self {
        Self {
            message: "Model retrained successfully".to_string(),
            model_id: outcome.handle.model_id,
            classification_report: outcome.report.classification_report.clone(),
            confusion_matrix: outcome.report.confusion_matrix.clone(),
            cross_val_mean: outcome.report.cross_val_mean,
            duration_ms: outcome.duration.as_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub model_loaded: bool,
    pub model_id: Option<Uuid>,
    pub backend: Option<String>,
    pub trained_at: Option<DateTime<Utc>>,
    pub training_samples: Option<usize>,
    pub retrain_state: RetrainState,
    pub last_retrain_failure: Option<String>,
}

/// Error body: `error` is the stable code, `details` carries structured
/// context such as the offending feature names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&PredictionError> for ErrorResponse {
    fn from(e: &PredictionError) -> Self {
        let details = match e {
            PredictionError::Validation(v) => Some(json!({
                "missing": v.missing,
                "invalid_type": v.invalid_type,
            })),
            PredictionError::InsufficientTrainingData {
                samples,
                distinct_labels,
            } => Some(json!({
                "samples": samples,
                "distinct_labels": distinct_labels,
            })),
            PredictionError::RetrainInProgress { state } => Some(json!({ "state": state })),
            _ => None,
        };
        Self {
            error: e.code().to_string(),
            message: e.to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FeatureValidationError;

    #[test]
    fn test_predict_response_shape() {
        let response = PredictResponse::from(Prediction::from(ClassProbabilities::from_scores([
            0.2, 0.3, 0.5,
        ])));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["prediction"], "HomeWin");
        assert!((value["probabilities"]["HomeWin"].as_f64().unwrap() - 0.5).abs() < 1e-12);
        assert!(value["probabilities"]["AwayWin"].is_number());
        assert!(value["probabilities"]["Draw"].is_number());
    }

    #[test]
    fn test_validation_error_body() {
        let err = PredictionError::from(FeatureValidationError {
            missing: vec!["home_totalShots".to_string()],
            invalid_type: vec![],
        });
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error, "MissingFeatures");
        assert_eq!(body.details.unwrap()["missing"][0], "home_totalShots");
    }

    #[test]
    fn test_error_without_details_omits_field() {
        let body = ErrorResponse::from(&PredictionError::model_unavailable("none"));
        assert_eq!(body.error, "ModelUnavailable");
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_predict_request_without_features() {
        let req: PredictRequest = serde_json::from_str("{}").unwrap();
        assert!(req.features.is_null());
    }
}
