//! Query stage: rank every document for every query and write the results table.

use clap::ValueEnum;
use vsm_core::config::SearchConfig;
use vsm_core::persist::save_results;
use vsm_core::{Cosine, Dot, QueryEngine, QueryResult, Result, Similarity};

/// Similarity selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SimilarityKind {
    #[default]
    Cosine,
    Dot,
}

impl SimilarityKind {
    pub fn similarity(self) -> &'static (dyn Similarity + Sync) {
        match self {
            SimilarityKind::Cosine => &Cosine,
            SimilarityKind::Dot => &Dot,
        }
    }
}

/// Load model and queries, score with `similarity`, write the results table.
pub fn search<S>(cfg: &SearchConfig, similarity: &S) -> Result<Vec<QueryResult>>
where
    S: Similarity + Sync + ?Sized,
{
    let engine = QueryEngine::load(&cfg.model, &cfg.queries)?;
    let results = engine.run(similarity);
    save_results(&cfg.results, &results)?;
    tracing::info!(path = %cfg.results.display(), rows = results.len(), "results table written");
    Ok(results)
}
