#![allow(dead_code)]

use matchcast::application::ml::trainer::{ModelTrainer, TrainingConfig};
use matchcast::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES};
use matchcast::domain::ml::outcome::MatchOutcome;
use matchcast::domain::ml::types::{FeatureVector, TrainingExample};
use serde_json::{Map, Value};

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Three well separated clusters: home-heavy stats win, away-heavy lose,
/// balanced draw.
pub fn synthetic_examples(n_per_class: usize) -> Vec<TrainingExample> {
    let mut out = Vec::with_capacity(n_per_class * 3);
    for i in 0..n_per_class {
        let wobble = (i % 5) as f64 * 0.15;
        for (outcome, home, away) in [
            (MatchOutcome::HomeWin, 9.0, 2.0),
            (MatchOutcome::AwayWin, 2.0, 9.0),
            (MatchOutcome::Draw, 5.0, 5.0),
        ] {
            out.push(TrainingExample::new(
                FeatureVector::from_values(side_values(home, away, wobble)),
                outcome,
            ));
        }
    }
    out
}

pub fn side_values(home: f64, away: f64, wobble: f64) -> [f64; FEATURE_COUNT] {
    let mut values = [0.0; FEATURE_COUNT];
    for (j, v) in values.iter_mut().enumerate() {
        let base = if j < FEATURE_COUNT / 2 { home } else { away };
        *v = base + wobble + j as f64 * 0.01;
    }
    values
}

/// Request payload `{ "features": { ... } }` for the given side levels.
pub fn request_body(home: f64, away: f64) -> Value {
    let mut features = Map::new();
    for (name, v) in FEATURE_NAMES.iter().zip(side_values(home, away, 0.3)) {
        features.insert(name.to_string(), Value::from(v));
    }
    serde_json::json!({ "features": features })
}

/// Small and fast: no cross-validation.
pub fn quick_trainer() -> ModelTrainer {
    ModelTrainer::new(TrainingConfig {
        cv_folds: 0,
        ..TrainingConfig::default()
    })
}
