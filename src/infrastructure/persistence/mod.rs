pub mod model_store;
pub mod training_data;

pub use model_store::{ArtifactHandle, ModelStore};
pub use training_data::{
    CsvTrainingSource, MatchDocumentSource, TrainingDataFormat, open_training_source,
};
