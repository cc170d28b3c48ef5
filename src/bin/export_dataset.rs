use anyhow::Context;
use clap::Parser;
use matchcast::application::ml::dataset_builder::{DatasetBuilder, MissingStatsPolicy};
use matchcast::infrastructure::observability::init_logging;
use matchcast::infrastructure::persistence::training_data::{
    read_match_documents, write_training_csv,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Flattens JSON match documents into the training CSV layout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of match documents
    #[arg(long, default_value = "data/matches.json")]
    input: PathBuf,

    /// Destination CSV
    #[arg(long, default_value = "data/matches.csv")]
    output: PathBuf,

    /// zero or skip: matches with a missing statistics block
    #[arg(long, default_value = "zero")]
    missing_stats: MissingStatsPolicy,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Args::parse();
    let records = read_match_documents(&args.input)?;
    let builder = DatasetBuilder::new(args.missing_stats);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {:?}", args.output))?;
    let written = write_training_csv(
        BufWriter::new(file),
        records.iter().filter_map(|r| builder.flatten(r)),
    )?;

    info!(
        "Exported {} of {} matches to {:?}",
        written,
        records.len(),
        args.output
    );
    println!(
        "{} rows written to {:?} ({} skipped)",
        written,
        args.output,
        records.len() - written
    );
    Ok(())
}
