/// Per-side statistic names, in feature order.
/// Keys match the nested `stats` block of a match document.
pub const STAT_NAMES: [&str; 11] = [
    "shotsOnGoal",
    "shotsOffGoal",
    "totalShots",
    "blockedShots",
    "shotsInsideBox",
    "shotsOutsideBox",
    "cornerKicks",
    "goalkeeperSaves",
    "totalPasses",
    "accuratePasses",
    "expectedGoals",
];

pub const STATS_PER_SIDE: usize = STAT_NAMES.len();

pub const FEATURE_COUNT: usize = STATS_PER_SIDE * 2;

/// Ordered list of feature names.
/// This order MUST match the column order of trained models.
/// Any change here is a breaking change for persisted artifacts.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "home_shotsOnGoal",
    "home_shotsOffGoal",
    "home_totalShots",
    "home_blockedShots",
    "home_shotsInsideBox",
    "home_shotsOutsideBox",
    "home_cornerKicks",
    "home_goalkeeperSaves",
    "home_totalPasses",
    "home_accuratePasses",
    "home_expectedGoals",
    "away_shotsOnGoal",
    "away_shotsOffGoal",
    "away_totalShots",
    "away_blockedShots",
    "away_shotsInsideBox",
    "away_shotsOutsideBox",
    "away_cornerKicks",
    "away_goalkeeperSaves",
    "away_totalPasses",
    "away_accuratePasses",
    "away_expectedGoals",
];

/// Side of the pitch a statistic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    /// Index of the first feature of this side.
    pub fn offset(self) -> usize {
        match self {
            Side::Home => 0,
            Side::Away => STATS_PER_SIDE,
        }
    }
}

/// Position of a feature in the schema.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// True when `names` lists exactly the schema, in order.
pub fn matches_schema<S: AsRef<str>>(names: &[S]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .all(|(a, b)| a.as_ref() == *b)
}
