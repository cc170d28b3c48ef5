mod common;

use common::{init_test_logging, quick_trainer, synthetic_examples};
use matchcast::application::ml::backend::{ClassifierBackend, ClassifierParams};
use matchcast::application::ml::predictor::ActiveModel;
use matchcast::application::ml::retrain::{RetrainOrchestrator, RetrainState};
use matchcast::application::ml::svm_backend::{RbfSvmBackend, SvmSettings};
use matchcast::application::ml::trainer::{ModelTrainer, TrainingConfig};
use matchcast::domain::errors::PredictionError;
use matchcast::domain::ml::feature_registry::FEATURE_COUNT;
use matchcast::domain::ml::outcome::MatchOutcome;
use matchcast::domain::ml::types::FeatureVector;
use matchcast::infrastructure::mock::InMemoryTrainingSource;
use matchcast::infrastructure::observability::Metrics;
use matchcast::infrastructure::persistence::model_store::ModelStore;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(
    source: InMemoryTrainingSource,
    store: ModelStore,
    active: Arc<ActiveModel>,
) -> RetrainOrchestrator {
    RetrainOrchestrator::new(
        Arc::new(source),
        quick_trainer(),
        store,
        active,
        Metrics::new().unwrap(),
    )
}

#[tokio::test]
async fn test_overlapping_retrains_are_rejected() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let source =
        InMemoryTrainingSource::new(synthetic_examples(10)).with_delay(Duration::from_millis(300));
    let orchestrator = orchestrator(
        source.clone(),
        ModelStore::new(dir.path().join("model.json")),
        Arc::new(ActiveModel::new()),
    );

    let (first, second) = tokio::join!(orchestrator.retrain(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.retrain().await
    });

    assert!(first.is_ok(), "first retrain failed: {:?}", first.err());
    match second {
        Err(PredictionError::RetrainInProgress { state }) => assert_eq!(state, "Loading"),
        other => panic!("expected RetrainInProgress, got {:?}", other.map(|o| o.handle)),
    }
    // The rejected call never reached the data source
    assert_eq!(source.load_count(), 1);
    assert_eq!(orchestrator.state(), RetrainState::Idle);
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_retrain_allowed_again_after_completion() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let active = Arc::new(ActiveModel::new());
    let orchestrator = orchestrator(
        InMemoryTrainingSource::new(synthetic_examples(10)),
        ModelStore::new(dir.path().join("model.json")),
        Arc::clone(&active),
    );

    let first = orchestrator.retrain().await?;
    let second = orchestrator.retrain().await?;
    assert_ne!(first.handle.model_id, second.handle.model_id);
    assert_eq!(active.snapshot().map(|m| m.id()), Some(second.handle.model_id));
    Ok(())
}

#[tokio::test]
async fn test_failed_load_keeps_active_model() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ModelStore::new(dir.path().join("model.json"));
    let active = Arc::new(ActiveModel::new());

    let good = orchestrator(
        InMemoryTrainingSource::new(synthetic_examples(10)),
        store.clone(),
        Arc::clone(&active),
    );
    let trained = good.retrain().await?;

    let broken = orchestrator(
        InMemoryTrainingSource::failing("database offline"),
        store.clone(),
        Arc::clone(&active),
    );
    let err = broken.retrain().await.unwrap_err();
    assert!(matches!(err, PredictionError::DataSourceFailure { .. }));
    assert!(err.to_string().contains("database offline"));
    assert!(broken.last_failure().unwrap().contains("database offline"));
    assert_eq!(broken.state(), RetrainState::Idle);

    assert_eq!(active.snapshot().map(|m| m.id()), Some(trained.handle.model_id));
    assert_eq!(store.load_active()?.id(), trained.handle.model_id);
    Ok(())
}

#[tokio::test]
async fn test_single_label_data_keeps_active_model() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ModelStore::new(dir.path().join("model.json"));
    let active = Arc::new(ActiveModel::new());
    let source = InMemoryTrainingSource::new(synthetic_examples(10));
    let orchestrator = orchestrator(source.clone(), store.clone(), Arc::clone(&active));
    let trained = orchestrator.retrain().await?;

    let draws_only = synthetic_examples(10)
        .into_iter()
        .filter(|e| e.outcome == MatchOutcome::Draw)
        .collect();
    source.replace(draws_only).await;

    let err = orchestrator.retrain().await.unwrap_err();
    assert!(matches!(
        err,
        PredictionError::InsufficientTrainingData {
            samples: 10,
            distinct_labels: 1
        }
    ));

    let model = active.snapshot().unwrap();
    assert_eq!(model.id(), trained.handle.model_id);
    let p = model.predict(&FeatureVector::from_values([5.0; FEATURE_COUNT]))?;
    assert!((p.probabilities.total() - 1.0).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_predictions_continue_during_retrain() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let active = Arc::new(ActiveModel::new());
    let source = InMemoryTrainingSource::new(synthetic_examples(10));
    let orchestrator = orchestrator(
        source.clone(),
        ModelStore::new(dir.path().join("model.json")),
        Arc::clone(&active),
    );
    let first = orchestrator.retrain().await?;

    let slow = RetrainOrchestrator::new(
        Arc::new(source.with_delay(Duration::from_millis(200))),
        quick_trainer(),
        ModelStore::new(dir.path().join("model.json")),
        Arc::clone(&active),
        Metrics::new()?,
    );
    let (outcome, during) = tokio::join!(slow.retrain(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let model = active.snapshot().expect("model stays loaded");
        (
            model.id(),
            model.predict(&FeatureVector::from_values([5.0; FEATURE_COUNT])),
        )
    });

    let outcome = outcome?;
    assert_eq!(during.0, first.handle.model_id);
    assert!(during.1.is_ok());
    assert_eq!(active.snapshot().map(|m| m.id()), Some(outcome.handle.model_id));
    Ok(())
}

#[tokio::test]
async fn test_failed_save_keeps_active_model() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let active = Arc::new(ActiveModel::new());
    let good = orchestrator(
        InMemoryTrainingSource::new(synthetic_examples(10)),
        ModelStore::new(dir.path().join("model.json")),
        Arc::clone(&active),
    );
    let trained = good.retrain().await?;

    // A file in place of the parent directory makes every save fail
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x")?;
    let broken = orchestrator(
        InMemoryTrainingSource::new(synthetic_examples(10)),
        ModelStore::new(blocker.join("model.json")),
        Arc::clone(&active),
    );

    let err = broken.retrain().await.unwrap_err();
    assert_eq!(err.code(), "PersistenceFailure");
    assert_eq!(broken.state(), RetrainState::Idle);
    assert!(!broken.is_running());
    assert!(broken.last_failure().is_some());
    assert_eq!(active.snapshot().map(|m| m.id()), Some(trained.handle.model_id));
    Ok(())
}

/// SVM backend that sleeps before every fit so intermediate states last.
struct SlowBackend {
    inner: RbfSvmBackend,
    pause: Duration,
}

impl ClassifierBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow_svm"
    }

    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<ClassifierParams, PredictionError> {
        std::thread::sleep(self.pause);
        self.inner.fit(rows, labels)
    }
}

#[tokio::test]
async fn test_retrain_walks_through_states() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pause = Duration::from_millis(150);
    let trainer = ModelTrainer::with_backend(
        TrainingConfig {
            cv_folds: 2,
            ..TrainingConfig::default()
        },
        Arc::new(SlowBackend {
            inner: RbfSvmBackend::new(SvmSettings::default()),
            pause,
        }),
    );
    let orchestrator = RetrainOrchestrator::new(
        Arc::new(InMemoryTrainingSource::new(synthetic_examples(10)).with_delay(pause)),
        trainer,
        ModelStore::new(dir.path().join("model.json")),
        Arc::new(ActiveModel::new()),
        Metrics::new()?,
    );
    assert_eq!(orchestrator.state(), RetrainState::Idle);

    let (outcome, seen) = tokio::join!(orchestrator.retrain(), async {
        let mut seen: Vec<RetrainState> = Vec::new();
        loop {
            let state = orchestrator.state();
            if seen.last() != Some(&state) {
                seen.push(state);
            }
            if seen.len() > 1 && state == RetrainState::Idle {
                break seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    outcome?;
    let position = |s: RetrainState| seen.iter().position(|x| *x == s);
    let loading = position(RetrainState::Loading).expect("Loading observed");
    let training = position(RetrainState::Training).expect("Training observed");
    let evaluating = position(RetrainState::Evaluating).expect("Evaluating observed");
    assert!(loading < training && training < evaluating, "states: {:?}", seen);
    assert!(!seen.contains(&RetrainState::Failed));
    assert_eq!(seen.last(), Some(&RetrainState::Idle));
    Ok(())
}
