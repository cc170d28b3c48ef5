use super::feature_registry::{FEATURE_COUNT, FEATURE_NAMES, feature_index};
use super::outcome::MatchOutcome;
use serde::{Deserialize, Serialize};

/// Fixed-order vector of the 22 schema features.
///
/// Only built by the feature validator or the dataset builder, so every
/// value is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub(crate) fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Builds a vector from raw values, replacing non-finite entries with 0.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values.map(|v| if v.is_finite() { v } else { 0.0 }))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.0[i])
    }

    /// Iterates `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// A labeled feature vector produced from a historical match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub outcome: MatchOutcome,
}

impl TrainingExample {
    pub fn new(features: FeatureVector, outcome: MatchOutcome) -> Self {
        Self { features, outcome }
    }
}

/// Probability distribution over the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "HomeWin")]
    pub home_win: f64,
    #[serde(rename = "Draw")]
    pub draw: f64,
    #[serde(rename = "AwayWin")]
    pub away_win: f64,
}

impl ClassProbabilities {
    /// Builds a distribution from non-negative scores indexed by
    /// `MatchOutcome::index`. A zero total yields a uniform distribution.
    pub fn from_scores(scores: [f64; MatchOutcome::COUNT]) -> Self {
        let clipped = scores.map(|s| if s.is_finite() && s > 0.0 { s } else { 0.0 });
        let total: f64 = clipped.iter().sum();
        let normalized = if total > 0.0 {
            clipped.map(|s| s / total)
        } else {
            [1.0 / MatchOutcome::COUNT as f64; MatchOutcome::COUNT]
        };
        Self::from_indexed(normalized)
    }

    /// All mass on a single outcome.
    pub fn certain(outcome: MatchOutcome) -> Self {
        let mut scores = [0.0; MatchOutcome::COUNT];
        scores[outcome.index()] = 1.0;
        Self::from_indexed(scores)
    }

    fn from_indexed(p: [f64; MatchOutcome::COUNT]) -> Self {
        Self {
            away_win: p[MatchOutcome::AwayWin.index()],
            draw: p[MatchOutcome::Draw.index()],
            home_win: p[MatchOutcome::HomeWin.index()],
        }
    }

    pub fn get(&self, outcome: MatchOutcome) -> f64 {
        match outcome {
            MatchOutcome::AwayWin => self.away_win,
            MatchOutcome::Draw => self.draw,
            MatchOutcome::HomeWin => self.home_win,
        }
    }

    pub fn total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }

    /// Most likely outcome; ties go to the lowest class index.
    pub fn most_likely(&self) -> MatchOutcome {
        let mut best = MatchOutcome::AwayWin;
        for outcome in MatchOutcome::ALL {
            if self.get(outcome) > self.get(best) {
                best = outcome;
            }
        }
        best
    }
}

/// Result of classifying one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub outcome: MatchOutcome,
    pub probabilities: ClassProbabilities,
}

impl From<ClassProbabilities> for Prediction {
    fn from(probabilities: ClassProbabilities) -> Self {
        Self {
            outcome: probabilities.most_likely(),
            probabilities,
        }
    }
}
