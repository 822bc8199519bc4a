use sprs::CsMat;
use std::collections::BTreeSet;

use crate::index::{InvertedIndex, TermId};
use crate::matrix::{TermDocMatrix, Vocabulary};
use crate::tokenizer::{normalize, tokens};
use crate::weighting::Weighting;

/// Weighted term-document matrix plus the term -> row mapping it was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub weights: CsMat<f64>,
    pub vocabulary: Vocabulary,
}

impl Model {
    /// Weight the counts of an already filtered index.
    pub fn build<W: Weighting + ?Sized>(index: &InvertedIndex, weighting: &W) -> Self {
        Self::from_matrix(TermDocMatrix::from_index(index), weighting)
    }

    pub fn from_matrix<W: Weighting + ?Sized>(matrix: TermDocMatrix, weighting: &W) -> Self {
        let weights = weighting.apply(&matrix.counts).to_csc();
        Self { weights, vocabulary: matrix.vocabulary }
    }

    pub fn n_terms(&self) -> usize {
        self.weights.rows()
    }

    pub fn n_docs(&self) -> usize {
        self.weights.cols()
    }

    /// Rows of the in-vocabulary terms of `text`, ascending and de-duplicated.
    /// Unknown terms are dropped.
    pub fn term_rows(&self, text: &str) -> Vec<TermId> {
        let normalized = normalize(text);
        tokens(&normalized)
            .filter_map(|t| self.vocabulary.get(t).copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Structural check used after loading from disk.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.vocabulary.len() != self.n_terms() {
            return Err(format!(
                "vocabulary has {} terms but matrix has {} rows",
                self.vocabulary.len(),
                self.n_terms()
            ));
        }
        // with the lengths equal, distinct in-range rows cover 0..n_terms exactly
        let mut seen = vec![false; self.n_terms()];
        for (term, &row) in &self.vocabulary {
            match seen.get_mut(row) {
                None => return Err(format!("term {term} maps to row {row} outside the matrix")),
                Some(true) => return Err(format!("term {term} maps to row {row}, already taken")),
                Some(taken) => *taken = true,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::TfIdf;

    #[test]
    fn term_rows_drop_unknown_and_repeats() {
        let idx = InvertedIndex::build([(1, "cat dog"), (2, "dog bird")]);
        let model = Model::build(&idx, &TfIdf::default());
        assert_eq!(model.term_rows("dog zebra cat dog"), vec![1, 2]);
        assert!(model.term_rows("zebra").is_empty());
        assert!(model.term_rows("").is_empty());
        assert!(model.validate().is_ok());
    }

    #[test]
    fn validate_rejects_shared_and_stray_rows() {
        let idx = InvertedIndex::build([(1, "cat dog"), (2, "dog bird")]);
        let model = Model::build(&idx, &TfIdf::default());

        let mut shared = model.clone();
        // BIRD takes CAT's row, leaving row 0 unmapped
        shared.vocabulary.insert("BIRD".into(), 1);
        assert!(shared.validate().unwrap_err().contains("already taken"));

        let mut stray = model;
        stray.vocabulary.insert("DOG".into(), 3);
        assert!(stray.validate().unwrap_err().contains("outside the matrix"));
    }

    #[test]
    fn shape_matches_counts() {
        let idx = InvertedIndex::build([(1, "cat"), (3, "dog")]);
        let model = Model::build(&idx, &TfIdf::default());
        assert_eq!((model.n_terms(), model.n_docs()), (2, 3));
        assert!(model.weights.is_csc());
    }
}
