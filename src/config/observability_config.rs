//! Observability configuration parsing from environment variables.

use std::env;

/// Observability environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityEnvConfig {
    /// Record Prometheus metrics and print them with `matchcast status`
    pub enabled: bool,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("OBSERVABILITY_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
        }
    }
}
