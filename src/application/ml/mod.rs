// Dataset construction from match documents
pub mod dataset_builder;

// Preprocessing and probability calibration
pub mod calibration;
pub mod scaler;

// Classifier backends
pub mod backend;
pub mod forest_backend;
pub mod svm_backend;

pub mod evaluation;
pub mod model;
pub mod trainer;

// Serving and retraining
pub mod predictor;
pub mod retrain;

pub use backend::{BackendKind, BackendSettings, ClassifierBackend, ClassifierParams};
pub use dataset_builder::{DatasetBuilder, MissingStatsPolicy};
pub use evaluation::EvaluationReport;
pub use model::Model;
pub use predictor::{ActiveModel, Predictor};
pub use retrain::{RetrainOrchestrator, RetrainOutcome, RetrainState};
pub use trainer::{ModelTrainer, TrainingConfig};
