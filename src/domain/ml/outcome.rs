use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Final result of a match from the home side's point of view.
///
/// Classes are nominal. The numeric index only fixes column order for
/// classifiers and the confusion matrix (alphabetical order of the export
/// labels: "Away Win", "Draw", "Home Win").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchOutcome {
    AwayWin,
    Draw,
    HomeWin,
}

impl MatchOutcome {
    pub const ALL: [MatchOutcome; 3] = [MatchOutcome::AwayWin, MatchOutcome::Draw, MatchOutcome::HomeWin];

    pub const COUNT: usize = 3;

    pub fn from_goals(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            Ordering::Greater => MatchOutcome::HomeWin,
            Ordering::Less => MatchOutcome::AwayWin,
            Ordering::Equal => MatchOutcome::Draw,
        }
    }

    pub fn index(self) -> usize {
        match self {
            MatchOutcome::AwayWin => 0,
            MatchOutcome::Draw => 1,
            MatchOutcome::HomeWin => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Wire token used in API responses.
    pub fn token(self) -> &'static str {
        match self {
            MatchOutcome::AwayWin => "AwayWin",
            MatchOutcome::Draw => "Draw",
            MatchOutcome::HomeWin => "HomeWin",
        }
    }

    /// Label written to exported CSV files.
    pub fn export_label(self) -> &'static str {
        match self {
            MatchOutcome::AwayWin => "Away Win",
            MatchOutcome::Draw => "Draw",
            MatchOutcome::HomeWin => "Home Win",
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for MatchOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "homewin" | "2" => Ok(MatchOutcome::HomeWin),
            "awaywin" | "0" => Ok(MatchOutcome::AwayWin),
            "draw" | "1" => Ok(MatchOutcome::Draw),
            _ => anyhow::bail!(
                "Invalid match outcome: '{}'. Must be 'HomeWin', 'AwayWin' or 'Draw'",
                s
            ),
        }
    }
}
