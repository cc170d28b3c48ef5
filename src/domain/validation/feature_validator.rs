use crate::domain::errors::FeatureValidationError;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES};
use crate::domain::ml::types::FeatureVector;
use serde_json::{Map, Value};
use tracing::debug;

/// Validates caller-supplied feature maps against the feature schema.
///
/// Extra keys are ignored. Missing and mistyped features are collected over
/// the whole schema so the caller gets every problem in one response.
pub struct FeatureValidator;

impl FeatureValidator {
    /// Validates a feature object.
    pub fn validate(features: &Map<String, Value>) -> Result<FeatureVector, FeatureValidationError> {
        let mut values = [0.0; FEATURE_COUNT];
        let mut report = FeatureValidationError::default();

        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            match features.get(*name) {
                None => report.missing.push(name.to_string()),
                Some(value) => match finite_number(value) {
                    Some(v) => values[i] = v,
                    None => report.invalid_type.push(name.to_string()),
                },
            }
        }

        if report.is_empty() {
            Ok(FeatureVector::from_array(values))
        } else {
            debug!(
                "Feature validation FAILED: {} missing, {} invalid",
                report.missing.len(),
                report.invalid_type.len()
            );
            Err(report)
        }
    }

    /// Validates an arbitrary JSON value expected to be a feature object.
    /// Anything other than an object counts as every feature missing.
    pub fn validate_value(features: &Value) -> Result<FeatureVector, FeatureValidationError> {
        match features {
            Value::Object(map) => Self::validate(map),
            _ => Err(FeatureValidationError {
                missing: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
                invalid_type: Vec::new(),
            }),
        }
    }
}

/// JSON numbers only: booleans, strings and null are rejected.
fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_map() -> Map<String, Value> {
        FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), json!(i as f64 + 0.5)))
            .collect()
    }

    #[test]
    fn test_valid_map_passes() {
        let fv = FeatureValidator::validate(&valid_map()).unwrap();
        assert_eq!(fv.get("home_shotsOnGoal"), Some(0.5));
        assert_eq!(fv.get("away_expectedGoals"), Some(21.5));
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let mut map = valid_map();
        map.insert("home_fouls".to_string(), json!("lots"));
        assert!(FeatureValidator::validate(&map).is_ok());
    }

    #[test]
    fn test_removing_any_single_key_names_exactly_that_key() {
        for name in FEATURE_NAMES {
            let mut map = valid_map();
            map.remove(name);
            let err = FeatureValidator::validate(&map).unwrap_err();
            assert_eq!(err.missing, vec![name.to_string()]);
            assert!(err.invalid_type.is_empty());
        }
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        let mut map = valid_map();
        map.insert("home_totalShots".to_string(), json!("18"));
        map.insert("home_cornerKicks".to_string(), json!(true));
        map.insert("away_totalPasses".to_string(), Value::Null);
        map.insert("away_expectedGoals".to_string(), json!([1.0]));

        let err = FeatureValidator::validate(&map).unwrap_err();
        assert!(err.missing.is_empty());
        assert_eq!(
            err.invalid_type,
            vec![
                "home_totalShots",
                "home_cornerKicks",
                "away_totalPasses",
                "away_expectedGoals"
            ]
        );
    }

    #[test]
    fn test_both_checks_reported_together() {
        let mut map = valid_map();
        map.remove("away_shotsOnGoal");
        map.insert("home_shotsOnGoal".to_string(), json!("ten"));

        let err = FeatureValidator::validate(&map).unwrap_err();
        assert_eq!(err.missing, vec!["away_shotsOnGoal"]);
        assert_eq!(err.invalid_type, vec!["home_shotsOnGoal"]);
    }

    #[test]
    fn test_partial_payload_lists_missing_in_schema_order() {
        let payload = json!({ "home_shotsOnGoal": 5, "away_totalShots": 12 });
        let err = FeatureValidator::validate_value(&payload).unwrap_err();
        assert_eq!(err.missing.len(), FEATURE_COUNT - 2);
        assert_eq!(err.missing[0], "home_shotsOffGoal");
        assert!(!err.missing.contains(&"away_totalShots".to_string()));
    }

    #[test]
    fn test_non_object_payload() {
        let err = FeatureValidator::validate_value(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.missing.len(), FEATURE_COUNT);
    }
}
