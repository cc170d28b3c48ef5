use anyhow::Context;
use clap::Parser;
use matchcast::application::ml::backend::{BackendKind, BackendSettings};
use matchcast::application::ml::forest_backend::ForestSettings;
use matchcast::application::ml::svm_backend::SvmSettings;
use matchcast::application::ml::trainer::ModelTrainer;
use matchcast::config::Config;
use matchcast::domain::ml::types::TrainingExample;
use matchcast::infrastructure::observability::init_logging;
use matchcast::infrastructure::persistence::training_data::{
    TrainingDataFormat, open_training_source,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Trains several backend configurations on the same split and ranks them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Training data (CSV export or JSON match documents)
    #[arg(long)]
    input: Option<PathBuf>,

    /// TOML file with `[[candidates]]` entries; a built-in set is used otherwise
    #[arg(long)]
    grid: Option<PathBuf>,

    /// Seed shared by every candidate
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Grid {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    name: String,
    #[serde(flatten)]
    settings: BackendSettings,
}

#[derive(Debug)]
struct Score {
    name: String,
    accuracy: f64,
    cv_mean: Option<f64>,
    elapsed_ms: u128,
}

fn builtin_candidates() -> Vec<Candidate> {
    let svm = |c: f64| BackendSettings {
        kind: BackendKind::Svm,
        svm: SvmSettings { c, gamma: None },
        forest: ForestSettings::default(),
    };
    let forest = |n_trees: u16| BackendSettings {
        kind: BackendKind::RandomForest,
        svm: SvmSettings::default(),
        forest: ForestSettings {
            n_trees,
            ..ForestSettings::default()
        },
    };
    vec![
        Candidate {
            name: "svm_c0.1".to_string(),
            settings: svm(0.1),
        },
        Candidate {
            name: "svm_c1".to_string(),
            settings: svm(1.0),
        },
        Candidate {
            name: "svm_c10".to_string(),
            settings: svm(10.0),
        },
        Candidate {
            name: "forest_100".to_string(),
            settings: forest(100),
        },
    ]
}

fn load_grid(path: &PathBuf) -> anyhow::Result<Vec<Candidate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid {:?}", path))?;
    let grid: Grid =
        toml::from_str(&raw).with_context(|| format!("Failed to parse grid {:?}", path))?;
    anyhow::ensure!(!grid.candidates.is_empty(), "Grid {:?} has no candidates", path);
    Ok(grid.candidates)
}

fn evaluate(config: &Config, candidates: Vec<Candidate>, examples: &[TrainingExample]) -> Vec<Score> {
    let mut scores = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut training = config.to_training_config();
        training.backend = candidate.settings;
        let trainer = ModelTrainer::new(training);

        let started = Instant::now();
        match trainer.train(examples) {
            Ok(run) => {
                info!(
                    "{}: accuracy {:.4}",
                    candidate.name,
                    run.report.accuracy()
                );
                scores.push(Score {
                    name: candidate.name,
                    accuracy: run.report.accuracy(),
                    cv_mean: run.report.cross_val_mean,
                    elapsed_ms: started.elapsed().as_millis(),
                });
            }
            Err(e) => warn!("{}: training failed: {}", candidate.name, e),
        }
    }
    scores
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Args::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(input) = &args.input {
        config.training_data_path = input.clone();
        config.training_data_format = TrainingDataFormat::infer(input);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let candidates = match &args.grid {
        Some(path) => load_grid(path)?,
        None => builtin_candidates(),
    };

    let source = open_training_source(
        config.training_data_path.clone(),
        config.training_data_format,
        config.dataset_builder(),
    );
    let examples = source.load_examples().await?;
    info!(
        "Comparing {} candidates on {} examples from {}",
        candidates.len(),
        examples.len(),
        source.describe()
    );

    let run_config = config.clone();
    let mut scores =
        tokio::task::spawn_blocking(move || evaluate(&run_config, candidates, &examples))
            .await
            .context("Comparison task panicked")?;
    anyhow::ensure!(!scores.is_empty(), "Every candidate failed to train");

    // Rank by cross-validation when available, hold-out accuracy otherwise
    scores.sort_by(|a, b| {
        let key = |s: &Score| s.cv_mean.unwrap_or(s.accuracy);
        key(b).total_cmp(&key(a))
    });

    println!(
        "\n{:<20} {:>10} {:>10} {:>10}",
        "candidate", "accuracy", "cv mean", "time ms"
    );
    for s in &scores {
        let cv = s
            .cv_mean
            .map(|m| format!("{:.4}", m))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:>10.4} {:>10} {:>10}",
            s.name, s.accuracy, cv, s.elapsed_ms
        );
    }
    println!("\nBest: {} (seed {})", scores[0].name, config.seed);
    Ok(())
}
