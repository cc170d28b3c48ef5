//! Logging setup and Prometheus metrics for matchcast
//!
//! Metrics are only rendered on demand (`matchcast status`); nothing listens
//! for incoming requests.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::Metrics;
