// Training, evaluation and serving pipeline
pub mod ml;

// Request-level facade
pub mod service;

pub use service::PredictionService;
