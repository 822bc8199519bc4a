use sprs::{CsMat, TriMat};
use std::collections::BTreeMap;

use crate::index::{DocId, InvertedIndex, TermId};

/// Term -> matrix row. Ordered so the persisted model is byte-stable.
pub type Vocabulary = BTreeMap<String, TermId>;

/// Raw occurrence counts, terms as rows and documents as columns (CSC).
#[derive(Debug, Clone)]
pub struct TermDocMatrix {
    pub counts: CsMat<f64>,
    pub vocabulary: Vocabulary,
}

impl TermDocMatrix {
    /// Build from an already filtered index.
    ///
    /// Rows follow the index's term order. Column count is the highest record
    /// number, so record `d` lives in column `d - 1` and ids missing from the
    /// corpus become empty columns. Record number 0 has no column and is skipped.
    pub fn from_index(index: &InvertedIndex) -> Self {
        let n_terms = index.len();
        let n_docs = index.max_doc_id().unwrap_or(0) as usize;

        let mut vocabulary = Vocabulary::new();
        let mut tri = TriMat::with_capacity((n_terms, n_docs), index.total_postings());
        let mut skipped = 0usize;

        for (row, (term, postings)) in index.postings.iter().enumerate() {
            vocabulary.insert(term.clone(), row);
            for (doc_id, count) in runs(postings) {
                if doc_id == 0 {
                    skipped += count;
                    continue;
                }
                tri.add_triplet(row, doc_id as usize - 1, count as f64);
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "postings with record number 0 ignored");
        }

        Self { counts: tri.to_csc(), vocabulary }
    }

    pub fn n_terms(&self) -> usize {
        self.counts.rows()
    }

    pub fn n_docs(&self) -> usize {
        self.counts.cols()
    }

    /// Raw count of `term` in record `doc_id`, 0 when absent.
    pub fn count(&self, term: &str, doc_id: DocId) -> f64 {
        match (self.vocabulary.get(term), (doc_id as usize).checked_sub(1)) {
            (Some(&row), Some(col)) if col < self.n_docs() => {
                self.counts.get(row, col).copied().unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Columns with no stored non-zero entry.
    pub fn empty_documents(&self) -> usize {
        self.counts
            .outer_iterator()
            .filter(|col| col.iter().all(|(_, &v)| v == 0.0))
            .count()
    }
}

/// Collapse a sorted posting list into `(doc_id, occurrences)` pairs.
fn runs(postings: &[DocId]) -> impl Iterator<Item = (DocId, usize)> + '_ {
    postings
        .chunk_by(|a, b| a == b)
        .map(|run| (run[0], run.len()))
}
