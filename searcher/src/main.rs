use anyhow::{Context, Result};
use clap::Parser;
use searcher::{search, SimilarityKind};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::config::PipelineFile;

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Rank the corpus against every processed query", long_about = None)]
struct Args {
    /// Pipeline configuration file
    #[arg(long, default_value = "pipeline.toml")]
    config: PathBuf,
    /// Document/query similarity
    #[arg(long, value_enum, default_value_t = SimilarityKind::Cosine)]
    similarity: SimilarityKind,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let cfg = PipelineFile::load(&args.config)
        .and_then(|f| f.search_config())
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let _span = tracing::info_span!("stage", name = "search", similarity = ?args.similarity).entered();
    let results = search(&cfg, args.similarity.similarity()).context("search failed")?;
    tracing::info!(queries = results.len(), "stage complete");
    Ok(())
}
