use crate::domain::ml::outcome::MatchOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

const N: usize = MatchOutcome::COUNT;

/// Rows are true labels, columns are predictions, both in class index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<MatchOutcome>,
    pub matrix: [[u32; N]; N],
}

impl ConfusionMatrix {
    pub fn from_pairs(truth: &[MatchOutcome], predicted: &[MatchOutcome]) -> Self {
        let mut matrix = [[0u32; N]; N];
        for (t, p) in truth.iter().zip(predicted.iter()) {
            matrix[t.index()][p.index()] += 1;
        }
        Self {
            labels: MatchOutcome::ALL.to_vec(),
            matrix,
        }
    }

    pub fn total(&self) -> u32 {
        self.matrix.iter().flatten().sum()
    }

    pub fn correct(&self) -> u32 {
        (0..N).map(|i| self.matrix[i][i]).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision, recall and F1 plus their averages.
///
/// Undefined ratios (no predictions or no support) count as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub away_win: ClassMetrics,
    pub draw: ClassMetrics,
    pub home_win: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let per_class: [ClassMetrics; N] = std::array::from_fn(|k| {
            let tp = cm.matrix[k][k] as f64;
            let predicted: u32 = (0..N).map(|i| cm.matrix[i][k]).sum();
            let support: u32 = cm.matrix[k].iter().sum();
            let precision = ratio(tp, predicted as f64);
            let recall = ratio(tp, support as f64);
            ClassMetrics {
                precision,
                recall,
                f1: ratio(2.0 * precision * recall, precision + recall),
                support,
            }
        });

        let total = cm.total() as f64;
        let macro_avg = AveragedMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / N as f64,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / N as f64,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / N as f64,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            ratio(
                per_class.iter().map(|m| f(m) * m.support as f64).sum(),
                total,
            )
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        Self {
            away_win: per_class[MatchOutcome::AwayWin.index()],
            draw: per_class[MatchOutcome::Draw.index()],
            home_win: per_class[MatchOutcome::HomeWin.index()],
            accuracy: ratio(cm.correct() as f64, total),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, outcome: MatchOutcome) -> &ClassMetrics {
        match outcome {
            MatchOutcome::AwayWin => &self.away_win,
            MatchOutcome::Draw => &self.draw,
            MatchOutcome::HomeWin => &self.home_win,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Which rows produced the reported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSet {
    HoldOut,
    /// Too few samples to hold any out; metrics are optimistic.
    TrainingData,
}

/// Everything measured about a freshly trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub classification_report: ClassificationReport,
    pub confusion_matrix: ConfusionMatrix,
    pub cross_val_scores: Vec<f64>,
    /// Mean of `cross_val_scores`, absent when no fold could be scored
    pub cross_val_mean: Option<f64>,
    pub evaluated_on: EvaluationSet,
    pub evaluation_samples: usize,
}

impl EvaluationReport {
    pub fn new(
        truth: &[MatchOutcome],
        predicted: &[MatchOutcome],
        cross_val_scores: Vec<f64>,
        evaluated_on: EvaluationSet,
    ) -> Self {
        let confusion_matrix = ConfusionMatrix::from_pairs(truth, predicted);
        let cross_val_mean = if cross_val_scores.is_empty() {
            None
        } else {
            Some(cross_val_scores.iter().sum::<f64>() / cross_val_scores.len() as f64)
        };
        Self {
            classification_report: ClassificationReport::from_confusion(&confusion_matrix),
            confusion_matrix,
            cross_val_scores,
            cross_val_mean,
            evaluated_on,
            evaluation_samples: truth.len(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.classification_report.accuracy
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.classification_report;
        writeln!(
            f,
            "{:>10} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for outcome in MatchOutcome::ALL {
            let m = r.class(outcome);
            writeln!(
                f,
                "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                outcome.token(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>10} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            r.accuracy,
            self.evaluation_samples
        )?;
        for (name, avg) in [("macro avg", &r.macro_avg), ("weighted", &r.weighted_avg)] {
            writeln!(
                f,
                "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.evaluation_samples
            )?;
        }

        writeln!(f, "\nConfusion matrix (rows = true, cols = predicted):")?;
        for (outcome, row) in MatchOutcome::ALL.iter().zip(self.confusion_matrix.matrix.iter()) {
            writeln!(f, "{:>10} {:?}", outcome.token(), row)?;
        }

        match self.cross_val_mean {
            Some(mean) => write!(
                f,
                "\nCross-validation accuracy: {:.4} over {} folds",
                mean,
                self.cross_val_scores.len()
            ),
            None => write!(f, "\nCross-validation accuracy: n/a"),
        }
    }
}
