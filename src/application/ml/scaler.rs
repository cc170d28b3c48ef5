use crate::domain::errors::PredictionError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Below this a feature is treated as constant.
const MIN_SCALE: f64 = 1e-12;

/// Per-feature standardization: `(x - mean) / std`.
///
/// Uses the population standard deviation. Constant features have a stored
/// scale of 0 and always transform to 0, i.e. they sit at the mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PredictionError> {
        let width = match rows.first() {
            Some(first) => first.len(),
            None => return Err(PredictionError::training("Cannot fit scaler on an empty set")),
        };
        if rows.iter().any(|r| r.len() != width) {
            return Err(PredictionError::training("Inconsistent feature row widths"));
        }

        let mut mean = Vec::with_capacity(width);
        let mut scale = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let m = column.iter().mean();
            let s = column.iter().population_std_dev();
            mean.push(m);
            scale.push(if s.is_finite() && s > MIN_SCALE { s } else { 0.0 });
        }

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.n_features() {
            return Err(PredictionError::training(format!(
                "Expected {} features, got {}",
                self.n_features(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| if *s == 0.0 { 0.0 } else { (x - m) / s })
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictionError> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
