//! RBF-kernel support vector classifier.
//!
//! Three one-vs-rest binary machines are trained with linfa-svm. Only the
//! support vectors, their signed coefficients and the bias are kept, so the
//! decision function `f(x) = Σ αᵢ·exp(-γ‖x - xᵢ‖²) - ρ` can be evaluated from
//! a persisted artifact. Each machine carries a Platt sigmoid fitted on its
//! training decisions; the three calibrated scores are normalized to sum to 1.

use super::backend::{ClassifierBackend, ClassifierParams, check_training_set};
use super::calibration::PlattSigmoid;
use crate::domain::errors::PredictionError;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::ClassProbabilities;
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Coefficients smaller than this do not define a support vector.
const ALPHA_EPS: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmSettings {
    /// Soft-margin penalty
    pub c: f64,
    /// Kernel width; `None` means `1 / n_features`
    pub gamma: Option<f64>,
}

impl Default for SvmSettings {
    fn default() -> Self {
        Self { c: 1.0, gamma: None }
    }
}

pub struct RbfSvmBackend {
    settings: SvmSettings,
}

impl RbfSvmBackend {
    pub fn new(settings: SvmSettings) -> Self {
        Self { settings }
    }
}

impl ClassifierBackend for RbfSvmBackend {
    fn name(&self) -> &str {
        "rbf_svm"
    }

    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[MatchOutcome],
    ) -> Result<ClassifierParams, PredictionError> {
        let width = check_training_set(rows, labels)?;
        let gamma = match self.settings.gamma {
            Some(g) if g.is_finite() && g > 0.0 => g,
            Some(g) => {
                return Err(PredictionError::training(format!(
                    "SVM gamma must be positive, got {}",
                    g
                )));
            }
            None => 1.0 / width as f64,
        };
        let c = self.settings.c;
        if !(c.is_finite() && c > 0.0) {
            return Err(PredictionError::training(format!(
                "SVM C must be positive, got {}",
                c
            )));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let records = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| PredictionError::training(format!("Matrix creation failed: {}", e)))?;

        let mut machines: [Option<BinaryMachine>; MatchOutcome::COUNT] = [None, None, None];
        for outcome in MatchOutcome::ALL {
            let targets: Vec<bool> = labels.iter().map(|l| *l == outcome).collect();
            if !targets.iter().any(|t| *t) {
                debug!("No {} samples, class gets zero probability", outcome);
                continue;
            }

            let dataset = Dataset::new(records.clone(), Array1::from_vec(targets.clone()));
            // linfa's Gaussian kernel is exp(-d² / eps)
            let svm = Svm::<_, bool>::params()
                .pos_neg_weights(c, c)
                .gaussian_kernel(1.0 / gamma)
                .fit(&dataset)
                .map_err(|e| {
                    PredictionError::training(format!("SVM fit failed for {}: {}", outcome, e))
                })?;

            let mut machine = BinaryMachine::from_alphas(rows, &svm.alpha, svm.rho);
            let decisions: Vec<f64> = rows.iter().map(|r| machine.decision(r, gamma)).collect();
            machine.calibration = PlattSigmoid::fit(&decisions, &targets);

            debug!(
                "{} vs rest: {} support vectors, rho {:.4}",
                outcome,
                machine.support_vectors.len(),
                machine.rho
            );
            machines[outcome.index()] = Some(machine);
        }

        Ok(ClassifierParams::RbfSvm(SvmParams {
            gamma,
            n_features: width,
            machines,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinaryMachine {
    support_vectors: Vec<Vec<f64>>,
    coefficients: Vec<f64>,
    rho: f64,
    calibration: PlattSigmoid,
}

impl BinaryMachine {
    fn from_alphas(rows: &[Vec<f64>], alpha: &[f64], rho: f64) -> Self {
        let (support_vectors, coefficients) = rows
            .iter()
            .zip(alpha.iter())
            .filter(|(_, a)| a.abs() > ALPHA_EPS)
            .map(|(r, a)| (r.clone(), *a))
            .unzip();
        Self {
            support_vectors,
            coefficients,
            rho,
            calibration: PlattSigmoid { a: 0.0, b: 0.0 },
        }
    }

    fn decision(&self, x: &[f64], gamma: f64) -> f64 {
        let sum: f64 = self
            .support_vectors
            .iter()
            .zip(self.coefficients.iter())
            .map(|(sv, a)| a * rbf_kernel(sv, x, gamma))
            .sum();
        sum - self.rho
    }
}

fn rbf_kernel(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let dist_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * dist_sq).exp()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmParams {
    gamma: f64,
    n_features: usize,
    machines: [Option<BinaryMachine>; MatchOutcome::COUNT],
}

impl SvmParams {
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn support_vector_count(&self) -> usize {
        self.machines
            .iter()
            .flatten()
            .map(|m| m.support_vectors.len())
            .sum()
    }

    /// Raw one-vs-rest decision values; absent classes report `None`.
    pub fn decision_values(
        &self,
        row: &[f64],
    ) -> Result<[Option<f64>; MatchOutcome::COUNT], PredictionError> {
        if row.len() != self.n_features {
            return Err(PredictionError::model_unavailable(format!(
                "Model expects {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let mut out = [None; MatchOutcome::COUNT];
        for (slot, machine) in out.iter_mut().zip(self.machines.iter()) {
            *slot = machine.as_ref().map(|m| m.decision(row, self.gamma));
        }
        Ok(out)
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, PredictionError> {
        let decisions = self.decision_values(row)?;
        let mut scores = [0.0; MatchOutcome::COUNT];
        for ((score, decision), machine) in scores
            .iter_mut()
            .zip(decisions.iter())
            .zip(self.machines.iter())
        {
            if let (Some(d), Some(m)) = (decision, machine) {
                *score = m.calibration.probability(*d);
            }
        }
        Ok(ClassProbabilities::from_scores(scores))
    }
}
