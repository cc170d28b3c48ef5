use crate::domain::ml::types::TrainingExample;
use crate::domain::ports::TrainingDataSource;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Training data held in memory, for tests and demos.
#[derive(Clone, Default)]
pub struct InMemoryTrainingSource {
    examples: Arc<RwLock<Vec<TrainingExample>>>,
    delay: Option<Duration>,
    fail_with: Option<String>,
    loads: Arc<AtomicUsize>,
}

impl InMemoryTrainingSource {
    pub fn new(examples: Vec<TrainingExample>) -> Self {
        Self {
            examples: Arc::new(RwLock::new(examples)),
            ..Default::default()
        }
    }

    /// Sleeps this long before every load, to keep a retrain in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every load fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Default::default()
        }
    }

    pub async fn replace(&self, examples: Vec<TrainingExample>) {
        *self.examples.write().await = examples;
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TrainingDataSource for InMemoryTrainingSource {
    async fn load_examples(&self) -> Result<Vec<TrainingExample>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.fail_with {
            anyhow::bail!("{}", reason);
        }
        Ok(self.examples.read().await.clone())
    }

    fn describe(&self) -> String {
        "in-memory examples".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::feature_registry::FEATURE_COUNT;
    use crate::domain::ml::outcome::MatchOutcome;
    use crate::domain::ml::types::FeatureVector;

    #[tokio::test]
    async fn test_returns_and_replaces_examples() {
        let example = TrainingExample::new(
            FeatureVector::from_values([1.0; FEATURE_COUNT]),
            MatchOutcome::Draw,
        );
        let source = InMemoryTrainingSource::new(vec![example.clone()]);
        assert_eq!(source.load_examples().await.unwrap(), vec![example.clone()]);

        source.replace(vec![example.clone(), example]).await;
        assert_eq!(source.load_examples().await.unwrap().len(), 2);
        assert_eq!(source.load_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = InMemoryTrainingSource::failing("feed offline");
        let err = source.load_examples().await.unwrap_err();
        assert!(err.to_string().contains("feed offline"));
    }
}
