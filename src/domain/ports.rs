use crate::domain::ml::types::TrainingExample;
use anyhow::Result;
use async_trait::async_trait;

/// Source of labeled historical matches for a retrain.
///
/// Implementations may be slow or fail; callers treat every load as fallible.
#[async_trait]
pub trait TrainingDataSource: Send + Sync {
    async fn load_examples(&self) -> Result<Vec<TrainingExample>>;

    /// Human-readable origin, for logs and reports.
    fn describe(&self) -> String;
}
