use anyhow::Context;
use clap::Parser;
use matchcast::application::ml::backend::BackendKind;
use matchcast::application::ml::dataset_builder::MissingStatsPolicy;
use matchcast::application::ml::trainer::ModelTrainer;
use matchcast::config::Config;
use matchcast::infrastructure::observability::init_logging;
use matchcast::infrastructure::persistence::model_store::ModelStore;
use matchcast::infrastructure::persistence::training_data::{
    TrainingDataFormat, open_training_source,
};
use std::path::PathBuf;
use tracing::info;

/// Offline training: fit a model on historical matches and store it.
///
/// Flags override the environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Training data (CSV export or JSON match documents)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Input format, inferred from the extension when omitted
    #[arg(long)]
    format: Option<TrainingDataFormat>,

    /// Where to write the model artifact
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seed for the train/test shuffle and the backend
    #[arg(long)]
    seed: Option<u64>,

    /// Share of samples held out for evaluation
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Cross-validation folds (0 or 1 disables)
    #[arg(long)]
    cv_folds: Option<usize>,

    /// svm or random_forest
    #[arg(long)]
    backend: Option<BackendKind>,

    /// SVM regularization strength
    #[arg(long)]
    c: Option<f64>,

    /// RBF kernel coefficient, 1/n_features when omitted
    #[arg(long)]
    gamma: Option<f64>,

    /// Number of trees in the random forest
    #[arg(long)]
    n_trees: Option<u16>,

    /// zero or skip: matches with a missing statistics block
    #[arg(long)]
    missing_stats: Option<MissingStatsPolicy>,

    /// Train and report without writing the artifact
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(input) = &self.input {
            config.training_data_path = input.clone();
            config.training_data_format = TrainingDataFormat::infer(input);
        }
        if let Some(format) = self.format {
            config.training_data_format = format;
        }
        if let Some(output) = &self.output {
            config.model_path = output.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(ratio) = self.test_ratio {
            anyhow::ensure!(
                (0.0..1.0).contains(&ratio),
                "--test-ratio must be in [0, 1), got {}",
                ratio
            );
            config.test_ratio = ratio;
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(c) = self.c {
            anyhow::ensure!(c > 0.0, "--c must be positive, got {}", c);
            config.backend.svm.c = c;
        }
        if let Some(gamma) = self.gamma {
            anyhow::ensure!(gamma > 0.0, "--gamma must be positive, got {}", gamma);
            config.backend.svm.gamma = Some(gamma);
        }
        if let Some(n_trees) = self.n_trees {
            config.backend.forest.n_trees = n_trees;
        }
        if let Some(policy) = self.missing_stats {
            config.missing_stats_policy = policy;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Args::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    args.apply(&mut config)?;

    let source = open_training_source(
        config.training_data_path.clone(),
        config.training_data_format,
        config.dataset_builder(),
    );
    info!("Loading training data from {}", source.describe());
    let examples = source.load_examples().await?;

    let trainer = ModelTrainer::new(config.to_training_config());
    info!(
        "Training {} on {} examples (seed {}, test ratio {}, {} folds)",
        trainer.backend_name(),
        examples.len(),
        config.seed,
        config.test_ratio,
        config.cv_folds
    );
    let run = tokio::task::spawn_blocking(move || trainer.train(&examples))
        .await
        .context("Training task panicked")??;

    println!("\n{}", run.report);
    match run.report.cross_val_mean {
        Some(mean) => println!("Cross-validation mean accuracy: {:.4}", mean),
        None => println!("Cross-validation skipped"),
    }

    if args.dry_run {
        println!("Dry run: model {} not saved", run.model.id());
        return Ok(());
    }

    let store = ModelStore::new(config.model_path.clone());
    let handle = store.save(&run.model)?;
    println!(
        "Model {} saved to {:?} ({} bytes, sha256 {})",
        handle.model_id, handle.path, handle.bytes, handle.checksum
    );
    Ok(())
}
