use crate::application::ml::dataset_builder::{DatasetBuilder, FlatMatchRow, parse_stat_str};
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES};
use crate::domain::ml::match_record::MatchRecord;
use crate::domain::ml::outcome::MatchOutcome;
use crate::domain::ml::types::{FeatureVector, TrainingExample};
use crate::domain::ports::TrainingDataSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LABEL_COLUMN: &str = "resultado";
const GOALS_HOME_COLUMN: &str = "goals_home";
const GOALS_AWAY_COLUMN: &str = "goals_away";

/// On-disk layout of the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingDataFormat {
    /// Flat CSV with one column per feature
    Csv,
    /// JSON array of match documents
    Json,
}

impl TrainingDataFormat {
    /// Guesses the format from the file extension, defaulting to CSV.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TrainingDataFormat::Json,
            _ => TrainingDataFormat::Csv,
        }
    }
}

impl FromStr for TrainingDataFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TrainingDataFormat::Csv),
            "json" => Ok(TrainingDataFormat::Json),
            _ => anyhow::bail!(
                "Invalid TRAINING_DATA_FORMAT: {}. Must be 'csv' or 'json'",
                s
            ),
        }
    }
}

/// Builds the source matching `format`.
pub fn open_training_source(
    path: impl Into<PathBuf>,
    format: TrainingDataFormat,
    builder: DatasetBuilder,
) -> Arc<dyn TrainingDataSource> {
    let path = path.into();
    match format {
        TrainingDataFormat::Csv => Arc::new(CsvTrainingSource::new(path)),
        TrainingDataFormat::Json => Arc::new(MatchDocumentSource::new(path, builder)),
    }
}

/// Header-driven CSV of flattened matches.
///
/// Reads the 22 feature columns plus either `resultado` or the two goal
/// columns. Missing feature columns read as 0; rows without a usable label
/// are skipped.
#[derive(Debug, Clone)]
pub struct CsvTrainingSource {
    path: PathBuf,
}

impl CsvTrainingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TrainingDataSource for CsvTrainingSource {
    async fn load_examples(&self) -> Result<Vec<TrainingExample>> {
        let content = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read training data {:?}", self.path))?;
        let examples = read_training_csv(content.as_slice())
            .with_context(|| format!("Failed to parse training data {:?}", self.path))?;
        info!("Read {} examples from {:?}", examples.len(), self.path);
        Ok(examples)
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }
}

pub fn read_training_csv<R: Read>(reader: R) -> Result<Vec<TrainingExample>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Missing CSV header row")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let feature_columns: Vec<Option<usize>> = FEATURE_NAMES.iter().map(|n| column(*n)).collect();
    let absent: Vec<&str> = FEATURE_NAMES
        .iter()
        .zip(feature_columns.iter())
        .filter(|(_, c)| c.is_none())
        .map(|(n, _)| *n)
        .collect();
    if !absent.is_empty() {
        warn!("Training CSV lacks columns {:?}, reading them as 0", absent);
    }

    let label_column = column(LABEL_COLUMN);
    let goal_columns = column(GOALS_HOME_COLUMN).zip(column(GOALS_AWAY_COLUMN));
    if label_column.is_none() && goal_columns.is_none() {
        anyhow::bail!(
            "Training CSV needs a '{}' column or '{}'/'{}' columns",
            LABEL_COLUMN,
            GOALS_HOME_COLUMN,
            GOALS_AWAY_COLUMN
        );
    }

    let mut examples = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", line + 2))?;

        let from_label = label_column
            .and_then(|c| record.get(c))
            .and_then(|s| s.parse::<MatchOutcome>().ok());
        let from_goals = || {
            let (h, a) = goal_columns?;
            let home = record.get(h)?.trim().parse::<u32>().ok()?;
            let away = record.get(a)?.trim().parse::<u32>().ok()?;
            Some(MatchOutcome::from_goals(home, away))
        };
        let Some(outcome) = from_label.or_else(from_goals) else {
            debug!("Skipping CSV row {}: no usable label", line + 2);
            continue;
        };

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, col) in values.iter_mut().zip(feature_columns.iter()) {
            *slot = col
                .and_then(|c| record.get(c))
                .and_then(parse_stat_str)
                .unwrap_or(0.0);
        }
        examples.push(TrainingExample::new(FeatureVector::from_values(values), outcome));
    }
    Ok(examples)
}

/// JSON array of raw match documents, flattened through the dataset builder.
#[derive(Debug, Clone)]
pub struct MatchDocumentSource {
    path: PathBuf,
    builder: DatasetBuilder,
}

impl MatchDocumentSource {
    pub fn new(path: impl Into<PathBuf>, builder: DatasetBuilder) -> Self {
        Self {
            path: path.into(),
            builder,
        }
    }
}

#[async_trait]
impl TrainingDataSource for MatchDocumentSource {
    async fn load_examples(&self) -> Result<Vec<TrainingExample>> {
        let content = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read match documents {:?}", self.path))?;
        let records: Vec<MatchRecord> = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse match documents {:?}", self.path))?;
        let examples: Vec<TrainingExample> = self.builder.build(&records).collect();
        info!(
            "Built {} examples from {} match documents",
            examples.len(),
            records.len()
        );
        Ok(examples)
    }

    fn describe(&self) -> String {
        format!("match documents {}", self.path.display())
    }
}

pub fn read_match_documents(path: &Path) -> Result<Vec<MatchRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open match documents {:?}", path))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse match documents {:?}", path))
}

/// Column order of exported CSV files.
pub fn export_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "matchId",
        "date",
        "home_team_id",
        "away_team_id",
        GOALS_HOME_COLUMN,
        GOALS_AWAY_COLUMN,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    headers.extend(FEATURE_NAMES.iter().map(|s| s.to_string()));
    headers.push(LABEL_COLUMN.to_string());
    headers
}

/// Writes flattened matches as CSV readable by `CsvTrainingSource`.
/// Returns the number of data rows written.
pub fn write_training_csv<W, I>(writer: W, rows: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = FlatMatchRow>,
{
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(export_headers())?;

    let mut count = 0;
    for row in rows {
        let mut record: Vec<String> = vec![
            row.match_id.map(|id| id.to_string()).unwrap_or_default(),
            row.date.unwrap_or_default(),
            row.home_team_id.to_string(),
            row.away_team_id.to_string(),
            row.goals_home.to_string(),
            row.goals_away.to_string(),
        ];
        record.extend(row.features.as_slice().iter().map(|v| v.to_string()));
        record.push(row.outcome.export_label().to_string());
        wtr.write_record(&record)?;
        count += 1;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(count)
}
