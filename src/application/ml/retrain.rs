use super::evaluation::EvaluationReport;
use super::predictor::ActiveModel;
use super::trainer::ModelTrainer;
use crate::domain::errors::PredictionError;
use crate::domain::ports::TrainingDataSource;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::model_store::{ArtifactHandle, ModelStore};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Phase of the retrain workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetrainState {
    Idle,
    Loading,
    Training,
    Evaluating,
    Swapping,
    Failed,
}

impl fmt::Display for RetrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a successful retrain.
#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    pub handle: ArtifactHandle,
    pub report: EvaluationReport,
    pub duration: Duration,
}

#[derive(Debug)]
struct RetrainStatus {
    in_flight: AtomicBool,
    state: Mutex<RetrainState>,
    last_failure: Mutex<Option<String>>,
}

impl RetrainStatus {
    fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            state: Mutex::new(RetrainState::Idle),
            last_failure: Mutex::new(None),
        }
    }

    fn state(&self) -> RetrainState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set(&self, next: RetrainState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn set_failure(&self, reason: Option<String>) {
        match self.last_failure.lock() {
            Ok(mut guard) => *guard = reason,
            Err(poisoned) => *poisoned.into_inner() = reason,
        }
    }

    fn last_failure(&self) -> Option<String> {
        match self.last_failure.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn claim(self: &Arc<Self>) -> Result<RetrainTicket, PredictionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PredictionError::RetrainInProgress {
                state: self.state().to_string(),
            });
        }
        Ok(RetrainTicket {
            status: Arc::clone(self),
        })
    }
}

/// RAII claim on the single retrain slot; releasing it returns to Idle.
struct RetrainTicket {
    status: Arc<RetrainStatus>,
}

impl RetrainTicket {
    fn set(&self, state: RetrainState) {
        self.status.set(state);
    }
}

impl Drop for RetrainTicket {
    fn drop(&mut self) {
        self.status.set(RetrainState::Idle);
        self.status.in_flight.store(false, Ordering::Release);
    }
}

/// Runs load, train, evaluate, persist and swap, one retrain at a time.
///
/// Predictions keep running against the previous model until the swap, and
/// any failure leaves the active model untouched.
pub struct RetrainOrchestrator {
    source: Arc<dyn TrainingDataSource>,
    trainer: Arc<ModelTrainer>,
    store: ModelStore,
    active: Arc<ActiveModel>,
    metrics: Metrics,
    status: Arc<RetrainStatus>,
}

impl RetrainOrchestrator {
    pub fn new(
        source: Arc<dyn TrainingDataSource>,
        trainer: ModelTrainer,
        store: ModelStore,
        active: Arc<ActiveModel>,
        metrics: Metrics,
    ) -> Self {
        Self {
            source,
            trainer: Arc::new(trainer),
            store,
            active,
            metrics,
            status: Arc::new(RetrainStatus::new()),
        }
    }

    pub fn state(&self) -> RetrainState {
        self.status.state()
    }

    pub fn last_failure(&self) -> Option<String> {
        self.status.last_failure()
    }

    pub fn is_running(&self) -> bool {
        self.status.in_flight.load(Ordering::Acquire)
    }

    pub async fn retrain(&self) -> Result<RetrainOutcome, PredictionError> {
        let ticket = self.status.claim()?;
        let started = Instant::now();
        info!("Retrain started from {}", self.source.describe());

        let result = self.run(&ticket).await;
        let duration = started.elapsed();
        self.metrics
            .observe_retrain(self.trainer.backend_name(), duration.as_secs_f64());

        match result {
            Ok((handle, report)) => {
                self.metrics.inc_retrains("success");
                self.metrics.model_accuracy.set(report.accuracy());
                if let Some(mean) = report.cross_val_mean {
                    self.metrics.model_cv_accuracy.set(mean);
                }
                self.status.set_failure(None);
                info!(
                    "Retrain finished in {:.2}s, model {} active",
                    duration.as_secs_f64(),
                    handle.model_id
                );
                Ok(RetrainOutcome {
                    handle,
                    report,
                    duration,
                })
            }
            Err(e) => {
                ticket.set(RetrainState::Failed);
                self.status.set_failure(Some(e.to_string()));
                self.metrics.inc_retrains("failure");
                error!("Retrain failed after {:.2}s: {}", duration.as_secs_f64(), e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ticket: &RetrainTicket,
    ) -> Result<(ArtifactHandle, EvaluationReport), PredictionError> {
        ticket.set(RetrainState::Loading);
        let examples = self.source.load_examples().await.map_err(|e| {
            PredictionError::DataSourceFailure {
                reason: format!("{:#}", e),
            }
        })?;
        info!("Loaded {} training examples", examples.len());

        ticket.set(RetrainState::Training);
        let trainer = Arc::clone(&self.trainer);
        let status = Arc::clone(&ticket.status);
        let run = tokio::task::spawn_blocking(move || {
            trainer.train_observed(&examples, || status.set(RetrainState::Evaluating))
        })
        .await
        .map_err(|e| PredictionError::training(format!("Training task aborted: {}", e)))??;

        ticket.set(RetrainState::Swapping);
        let model = Arc::new(run.model);
        let store = self.store.clone();
        let to_save = Arc::clone(&model);
        let handle = tokio::task::spawn_blocking(move || store.save(&to_save))
            .await
            .map_err(|e| PredictionError::persistence(format!("Save task aborted: {}", e)))??;

        self.active.swap(model);
        Ok((handle, run.report))
    }
}
