use super::feature_registry::Side;
use super::outcome::MatchOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Team reference as stored in match documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub winner: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTeams {
    pub home: TeamRef,
    pub away: TeamRef,
}

/// Final goal counts. Missing for matches that were not played.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
}

/// Statistics block of one team. Values are kept raw: numbers, numeric or
/// percentage strings, the "N/A" sentinel or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub team: TeamRef,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
}

/// One completed match as read from the historical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(default)]
    pub match_id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    pub teams: MatchTeams,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default)]
    pub statistics: Vec<TeamStatistics>,
}

impl MatchRecord {
    /// Outcome derived from goal counts, if both are known.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        match (self.goals.home, self.goals.away) {
            (Some(home), Some(away)) => Some(MatchOutcome::from_goals(home, away)),
            _ => None,
        }
    }

    pub fn team(&self, side: Side) -> &TeamRef {
        match side {
            Side::Home => &self.teams.home,
            Side::Away => &self.teams.away,
        }
    }

    /// Statistics block of the given side, located by team id.
    pub fn stats_for(&self, side: Side) -> Option<&Map<String, Value>> {
        let team_id = self.team(side).id;
        self.statistics
            .iter()
            .find(|s| s.team.id == team_id)
            .and_then(|s| s.stats.as_ref())
    }
}
