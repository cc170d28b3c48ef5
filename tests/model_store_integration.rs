mod common;

use common::{quick_trainer, synthetic_examples};
use matchcast::application::ml::backend::{BackendKind, BackendSettings};
use matchcast::application::ml::trainer::{ModelTrainer, TrainingConfig};
use matchcast::infrastructure::persistence::model_store::ModelStore;

#[test]
fn test_reloaded_model_predicts_identically() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ModelStore::new(dir.path().join("nested").join("model.json"));
    let examples = synthetic_examples(10);
    let run = quick_trainer().train(&examples)?;

    let handle = store.save(&run.model)?;
    assert_eq!(handle.model_id, run.model.id());
    let reloaded = store.load(&handle)?;

    let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.to_vec()).collect();
    assert_eq!(run.model.predict_rows(&rows)?, reloaded.predict_rows(&rows)?);
    assert_eq!(reloaded.metadata.feature_names, run.model.metadata.feature_names);
    Ok(())
}

#[test]
fn test_forest_model_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ModelStore::new(dir.path().join("forest.json"));
    let trainer = ModelTrainer::new(TrainingConfig {
        cv_folds: 0,
        backend: BackendSettings {
            kind: BackendKind::RandomForest,
            ..BackendSettings::default()
        },
        ..TrainingConfig::default()
    });
    let examples = synthetic_examples(8);
    let run = trainer.train(&examples)?;
    store.save(&run.model)?;

    let reloaded = store.load_active()?;
    assert_eq!(reloaded.metadata.backend, BackendKind::RandomForest);
    for e in &examples {
        assert_eq!(run.model.predict(&e.features)?, reloaded.predict(&e.features)?);
    }
    Ok(())
}

#[test]
fn test_same_seed_gives_same_model_behaviour() -> anyhow::Result<()> {
    let examples = synthetic_examples(10);
    let a = quick_trainer().train(&examples)?;
    let b = quick_trainer().train(&examples)?;

    assert_ne!(a.model.id(), b.model.id());
    assert_eq!(a.report, b.report);
    let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.to_vec()).collect();
    assert_eq!(a.model.predict_rows(&rows)?, b.model.predict_rows(&rows)?);
    Ok(())
}
