use crate::domain::ml::feature_registry::{FEATURE_COUNT, STAT_NAMES, Side};
use crate::domain::ml::match_record::MatchRecord;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::{FeatureVector, TrainingExample};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

/// Sentinel used by the sports-data feed for unavailable statistics.
const NOT_APPLICABLE: &str = "N/A";

/// What to do with a match whose side has no statistics block at all.
///
/// Individual absent or "N/A" fields always default to 0; this policy only
/// covers a missing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingStatsPolicy {
    /// Use an all-zero vector for that side
    #[default]
    ZeroFill,
    /// Drop the match from the dataset
    Skip,
}

impl FromStr for MissingStatsPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" | "zero_fill" | "zerofill" => Ok(MissingStatsPolicy::ZeroFill),
            "skip" => Ok(MissingStatsPolicy::Skip),
            _ => anyhow::bail!(
                "Invalid MISSING_STATS_POLICY: {}. Must be 'zero' or 'skip'",
                s
            ),
        }
    }
}

/// One match flattened for CSV export: identifiers, goals, the 22 features
/// and the derived label.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMatchRow {
    pub match_id: Option<i64>,
    pub date: Option<String>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub goals_home: u32,
    pub goals_away: u32,
    pub features: FeatureVector,
    pub outcome: MatchOutcome,
}

/// Turns historical match documents into labeled feature vectors.
///
/// Stateless: iterating twice over the same records yields the same examples.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetBuilder {
    policy: MissingStatsPolicy,
}

impl DatasetBuilder {
    pub fn new(policy: MissingStatsPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingStatsPolicy {
        self.policy
    }

    /// Lazily maps records to training examples, skipping unusable ones.
    pub fn build<'a, I>(&'a self, records: I) -> impl Iterator<Item = TrainingExample> + 'a
    where
        I: IntoIterator<Item = &'a MatchRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().filter_map(move |r| self.to_example(r))
    }

    pub fn to_example(&self, record: &MatchRecord) -> Option<TrainingExample> {
        let outcome = self.outcome_of(record)?;
        let features = self.extract_features(record)?;
        Some(TrainingExample::new(features, outcome))
    }

    pub fn flatten(&self, record: &MatchRecord) -> Option<FlatMatchRow> {
        let outcome = self.outcome_of(record)?;
        let features = self.extract_features(record)?;
        Some(FlatMatchRow {
            match_id: record.match_id,
            date: record.date.clone(),
            home_team_id: record.teams.home.id,
            away_team_id: record.teams.away.id,
            goals_home: record.goals.home.unwrap_or_default(),
            goals_away: record.goals.away.unwrap_or_default(),
            features,
            outcome,
        })
    }

    /// Feature vector for both sides, or None when the policy drops the match.
    pub fn extract_features(&self, record: &MatchRecord) -> Option<FeatureVector> {
        let mut values = [0.0; FEATURE_COUNT];

        for side in [Side::Home, Side::Away] {
            match record.stats_for(side) {
                Some(stats) => fill_side(&mut values, side, stats),
                None if self.policy == MissingStatsPolicy::Skip => {
                    debug!(
                        "Skipping match {:?}: no {} statistics block",
                        record.match_id,
                        side.prefix()
                    );
                    return None;
                }
                None => {
                    debug!(
                        "Match {:?}: no {} statistics block, using zeros",
                        record.match_id,
                        side.prefix()
                    );
                }
            }
        }

        Some(FeatureVector::from_values(values))
    }

    fn outcome_of(&self, record: &MatchRecord) -> Option<MatchOutcome> {
        let outcome = record.outcome();
        if outcome.is_none() {
            debug!("Skipping match {:?}: goal counts missing", record.match_id);
        }
        outcome
    }
}

fn fill_side(values: &mut [f64; FEATURE_COUNT], side: Side, stats: &Map<String, Value>) {
    for (i, stat) in STAT_NAMES.iter().enumerate() {
        values[side.offset() + i] = parse_stat(stats.get(*stat));
    }
}

/// Numeric value of a raw statistic.
///
/// Numbers pass through; strings are trimmed and stripped of a trailing `%`.
/// Absent, null, "N/A", unparseable or non-finite values become 0.
pub fn parse_stat(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_stat_str(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// String form of `parse_stat`, used for CSV cells.
pub fn parse_stat_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_APPLICABLE) {
        return None;
    }
    trimmed
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
