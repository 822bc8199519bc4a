//! Batch stages. Each reads immutable artifacts and writes the next one.
//!
//! Stages log through `tracing`; callers run them inside a span naming the stage.

use crate::config::{IndexConfig, InvertConfig, QueriesConfig};
use crate::corpus::{read_queries, read_records, Judgment, SourceCounts};
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::matrix::TermDocMatrix;
use crate::model::Model;
use crate::persist;
use crate::tokenizer::normalize;
use crate::weighting::Weighting;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueriesReport {
    pub queries: usize,
    pub judgments: usize,
}

/// Query file -> queries table (normalized text) and expected table.
pub fn process_queries(cfg: &QueriesConfig) -> Result<QueriesReport> {
    let raw = read_queries(&cfg.input)?;
    let declared: usize = raw.iter().filter_map(|q| q.declared_results).sum();
    tracing::info!(
        path = %cfg.input.display(),
        queries = raw.len(),
        declared_results = declared,
        "query file read"
    );

    let mut queries: Vec<(u32, String)> = raw.iter().map(|q| (q.number, normalize(&q.text))).collect();
    queries.sort_by_key(|(n, _)| *n);

    let mut expected: Vec<(u32, Judgment)> = raw
        .iter()
        .flat_map(|q| q.judgments.iter().map(move |j| (q.number, *j)))
        .collect();
    expected.sort_by_key(|(n, j)| (*n, j.doc_id));

    persist::save_query_tables(&cfg.queries, &queries, &cfg.expected, &expected)?;
    tracing::info!(
        queries_path = %cfg.queries.display(),
        expected_path = %cfg.expected.display(),
        queries = queries.len(),
        judgments = expected.len(),
        "query tables written"
    );

    Ok(QueriesReport { queries: queries.len(), judgments: expected.len() })
}

/// Corpus files -> unfiltered inverted list.
pub fn generate_inverted_list(cfg: &InvertConfig) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    let mut documents = 0usize;
    let mut tokens = 0usize;

    for path in &cfg.inputs {
        let records = read_records(path)?;
        let counts = SourceCounts::tally(&records);
        tracing::info!(
            path = %path.display(),
            records = records.len(),
            abstracts = counts.abstracts,
            extracts = counts.extracts,
            titles = counts.titles,
            empty = counts.empty,
            "corpus file read"
        );
        for record in &records {
            tokens += index.add_document(record.record_num, &record.text);
        }
        documents += records.len();
    }
    index.finish();

    persist::save_inverted_index(&cfg.output, &index)?;
    tracing::info!(
        path = %cfg.output.display(),
        documents,
        tokens,
        unique_terms = index.len(),
        "inverted list written"
    );
    Ok(index)
}

/// Inverted list -> filtered term-document matrix -> weighted model on disk.
pub fn build_model<W: Weighting + ?Sized>(cfg: &IndexConfig, weighting: &W) -> Result<Model> {
    let mut index = persist::load_inverted_index(&cfg.input)?;
    tracing::info!(path = %cfg.input.display(), terms = index.len(), "inverted list read");

    let report = index.retain_index_terms();
    tracing::info!(
        non_alphabetic = report.non_alphabetic,
        too_short = report.too_short,
        kept = report.kept,
        "vocabulary filtered"
    );

    let matrix = TermDocMatrix::from_index(&index);
    let empty = matrix.empty_documents();
    if empty > 0 {
        tracing::warn!(empty, "documents without indexed terms get zero weights");
    }
    tracing::info!(
        terms = matrix.n_terms(),
        docs = matrix.n_docs(),
        nnz = matrix.counts.nnz(),
        "term-document matrix built"
    );

    let model = Model::from_matrix(matrix, weighting);
    persist::save_model(&cfg.output, &model)?;
    tracing::info!(path = %cfg.output.display(), "model written");
    Ok(model)
}
