use anyhow::Context;
use clap::{Parser, Subcommand};
use matchcast::application::PredictionService;
use matchcast::config::Config;
use matchcast::domain::errors::PredictionError;
use matchcast::infrastructure::observability::init_logging;
use matchcast::interfaces::api::ErrorResponse;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Football match outcome prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the outcome of one match from its statistics
    Predict {
        /// JSON file with `{ "features": { ... } }`, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
    /// Retrain from TRAINING_DATA_PATH and replace the stored model
    Retrain,
    /// Show the stored model and metrics
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        "matchcast {} (model {:?}, backend {})",
        env!("CARGO_PKG_VERSION"),
        config.model_path,
        config.backend.kind.as_str()
    );
    let service = PredictionService::from_config(&config)?;

    match cli.command {
        Commands::Predict { input } => {
            let body = read_request(&input)?;
            let result = service.predict_json(&body);
            report(result)?;
        }
        Commands::Retrain => {
            let result = service.retrain_json().await;
            report(result)?;
        }
        Commands::Status => {
            print_json(&service.status())?;
            if config.observability_enabled {
                println!("{}", service.metrics().render());
            }
        }
    }

    Ok(())
}

fn read_request(input: &Path) -> anyhow::Result<Value> {
    let mut raw = String::new();
    if input.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read request from stdin")?;
    } else {
        raw = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request {:?}", input))?;
    }
    serde_json::from_str(&raw).context("Request is not valid JSON")
}

/// Prints the success body, or the error body and exits non-zero.
fn report<T: Serialize>(result: Result<T, PredictionError>) -> anyhow::Result<()> {
    match result {
        Ok(body) => print_json(&body),
        Err(e) => {
            print_json(&ErrorResponse::from(&e))?;
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }
}

fn print_json<T: Serialize>(body: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
