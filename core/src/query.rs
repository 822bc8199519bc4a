//! Query engine: vectorize queries in the model's term space and rank every
//! document column against them.

use rayon::prelude::*;
use sprs::CsVec;
use std::path::Path;

use crate::error::Result;
use crate::index::{DocId, TermId};
use crate::model::Model;
use crate::persist;
use crate::similarity::Similarity;
use crate::tokenizer::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub number: u32,
    /// Normalized query text.
    pub text: String,
    /// Vocabulary rows of the query's terms, ascending, no repeats.
    pub rows: Vec<TermId>,
}

/// One position of a ranking. `doc_id` is the record number (column + 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query_number: u32,
    pub ranking: Vec<RankedDoc>,
}

pub struct QueryEngine {
    model: Model,
    queries: Vec<Query>,
}

impl QueryEngine {
    /// Load a persisted model and a queries table.
    pub fn load(model_path: &Path, queries_path: &Path) -> Result<Self> {
        let model = persist::load_model(model_path)?;
        tracing::info!(
            path = %model_path.display(),
            terms = model.n_terms(),
            docs = model.n_docs(),
            "model loaded"
        );
        let rows = persist::load_queries(queries_path)?;
        let engine = Self::new(model, rows);
        tracing::info!(path = %queries_path.display(), queries = engine.queries.len(), "queries loaded");
        Ok(engine)
    }

    pub fn new<I>(model: Model, queries: I) -> Self
    where
        I: IntoIterator<Item = (u32, String)>,
    {
        let queries = queries
            .into_iter()
            .map(|(number, text)| {
                let text = normalize(&text);
                let rows = model.term_rows(&text);
                Query { number, text, rows }
            })
            .collect();
        Self { model, queries }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Binary indicator over term rows: 1 where the query has the term.
    pub fn indicator(&self, query: &Query) -> CsVec<f64> {
        CsVec::new(self.model.n_terms(), query.rows.clone(), vec![1.0; query.rows.len()])
    }

    /// Similarity of every document column to `query`, in column order.
    pub fn score<S: Similarity + ?Sized>(&self, query: &Query, similarity: &S) -> Vec<f64> {
        let q = self.indicator(query);
        self.model
            .weights
            .outer_iterator()
            .map(|doc| similarity.score(doc, q.view()))
            .collect()
    }

    /// Rank all documents for every query. Queries are scored in parallel;
    /// results come back in query order.
    pub fn run<S: Similarity + Sync + ?Sized>(&self, similarity: &S) -> Vec<QueryResult> {
        let mut empty = 0usize;
        for q in self.queries.iter().filter(|q| q.rows.is_empty()) {
            tracing::warn!(query = q.number, "query has no in-vocabulary terms; every document scores 0");
            empty += 1;
        }
        tracing::info!(queries = self.queries.len(), empty, "scoring queries");

        let results: Vec<QueryResult> = self
            .queries
            .par_iter()
            .map(|q| {
                let scores = self.score(q, similarity);
                tracing::debug!(query = q.number, terms = q.rows.len(), "query scored");
                QueryResult { query_number: q.number, ranking: rank(&scores) }
            })
            .collect();

        tracing::info!(queries = results.len(), "scoring finished");
        results
    }
}

/// Order columns by descending score. The sort is stable, so equal scores keep
/// column order. Ranks start at 1; document ids are column + 1.
pub fn rank(scores: &[f64]) -> Vec<RankedDoc> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
        .into_iter()
        .enumerate()
        .map(|(pos, col)| RankedDoc { rank: pos + 1, doc_id: col as DocId + 1, score: scores[col] })
        .collect()
}

impl QueryResult {
    /// Rebuild from the persisted `[rank, doc_id, score]` triples.
    pub fn from_triples(query_number: u32, triples: Vec<(usize, DocId, f64)>) -> Self {
        let ranking = triples
            .into_iter()
            .map(|(rank, doc_id, score)| RankedDoc { rank, doc_id, score })
            .collect();
        Self { query_number, ranking }
    }

    pub fn to_triples(&self) -> Vec<(usize, DocId, f64)> {
        self.ranking.iter().map(|r| (r.rank, r.doc_id, r.score)).collect()
    }
}
