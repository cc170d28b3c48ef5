// Feature schema
pub mod feature_registry;

// Historical match documents
pub mod match_record;

pub mod outcome;

// Feature vectors, examples and predictions
pub mod types;

pub use feature_registry::{FEATURE_COUNT, FEATURE_NAMES, STAT_NAMES, Side};
pub use match_record::MatchRecord;
pub use outcome::MatchOutcome;
pub use types::{ClassProbabilities, FeatureVector, Prediction, TrainingExample};
