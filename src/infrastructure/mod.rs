pub mod mock;
pub mod observability;
pub mod persistence;

pub use mock::InMemoryTrainingSource;
pub use persistence::{ArtifactHandle, ModelStore};
