//! Platt scaling for binary decision values.
//!
//! Maps an SVM decision value `f` to `P(y = 1 | f) = 1 / (1 + exp(A * f + B))`.
//! `A` and `B` are fitted by the regularized Newton method of Lin, Lin and
//! Weng (2007), with smoothed targets to avoid overfitting the extremes.

use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattSigmoid {
    pub a: f64,
    pub b: f64,
}

impl PlattSigmoid {
    pub fn fit(decisions: &[f64], labels: &[bool]) -> Self {
        let prior1 = labels.iter().filter(|l| **l).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decisions, &targets, a, b);

        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21, mut g1, mut g2) = (SIGMA, SIGMA, 0.0, 0.0, 0.0);
            for (f, t) in decisions.iter().zip(targets.iter()) {
                let (p, q) = split_sigmoid(f * a + b);
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(decisions, &targets, new_a, new_b);
                if new_f < fval + 0.0001 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            // Line search failed
            if step < MIN_STEP {
                break;
            }
        }

        Self { a, b }
    }

    pub fn probability(&self, decision: f64) -> f64 {
        split_sigmoid(decision * self.a + self.b).0
    }
}

/// Returns `(1 / (1 + e^x), e^x / (1 + e^x))` without overflow.
fn split_sigmoid(x: f64) -> (f64, f64) {
    if x >= 0.0 {
        let e = (-x).exp();
        (e / (1.0 + e), 1.0 / (1.0 + e))
    } else {
        let e = x.exp();
        (1.0 / (1.0 + e), e / (1.0 + e))
    }
}

fn objective(decisions: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decisions
        .iter()
        .zip(targets.iter())
        .map(|(f, t)| {
            let x = f * a + b;
            if x >= 0.0 {
                t * x + (1.0 + (-x).exp()).ln()
            } else {
                (t - 1.0) * x + (1.0 + x.exp()).ln()
            }
        })
        .sum()
}
