use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::config::PipelineFile;
use vsm_core::pipeline::{build_model, generate_inverted_list, process_queries};
use vsm_core::TfIdf;

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the query tables, inverted list and weighted model", long_about = None)]
struct Cli {
    /// Pipeline configuration file
    #[arg(long, global = true, default_value = "pipeline.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the query file into the queries and expected tables
    Queries,
    /// Generate the inverted list from the corpus files
    Invert,
    /// Build the TF-IDF model from the inverted list
    Index {
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
    /// Run queries, invert and index in order
    All {
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let file = PipelineFile::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    match cli.command {
        Commands::Queries => run_queries(&file),
        Commands::Invert => run_invert(&file),
        Commands::Index { smoothed_idf } => run_index(&file, smoothed_idf),
        Commands::All { smoothed_idf } => {
            // fail on any missing key before touching the corpus
            file.pipeline_config()?;
            run_queries(&file)?;
            run_invert(&file)?;
            run_index(&file, smoothed_idf)
        }
    }
}

fn run_queries(file: &PipelineFile) -> Result<()> {
    let cfg = file.queries_config()?;
    let _span = tracing::info_span!("stage", name = "queries").entered();
    let report = process_queries(&cfg).context("query processing failed")?;
    tracing::info!(queries = report.queries, judgments = report.judgments, "stage complete");
    Ok(())
}

fn run_invert(file: &PipelineFile) -> Result<()> {
    let cfg = file.invert_config()?;
    let _span = tracing::info_span!("stage", name = "invert").entered();
    let index = generate_inverted_list(&cfg).context("inverted list generation failed")?;
    tracing::info!(terms = index.len(), "stage complete");
    Ok(())
}

fn run_index(file: &PipelineFile, smoothed_idf: bool) -> Result<()> {
    let cfg = file.index_config()?;
    let _span = tracing::info_span!("stage", name = "index", smoothed_idf).entered();
    let weighting = TfIdf { smoothed_idf };
    let model = build_model(&cfg, &weighting).context("model build failed")?;
    tracing::info!(terms = model.n_terms(), docs = model.n_docs(), "stage complete");
    Ok(())
}
