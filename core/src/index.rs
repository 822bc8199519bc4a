use std::collections::BTreeMap;

use crate::tokenizer::{is_index_term, normalize, tokens};

/// Record number of a corpus document (1-based). Column `doc_id - 1` in the matrix.
pub type DocId = u32;
/// Row of a term in the term-document matrix.
pub type TermId = usize;

/// Term -> posting list, one entry per occurrence, ascending.
///
/// Repeats are kept on purpose: counting runs of the same id gives the raw term
/// frequency of that (term, document) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    pub postings: BTreeMap<String, Vec<DocId>>,
    /// Highest record number seen, including records whose terms were all
    /// filtered out or that had no text. Survives `retain_index_terms`.
    last_doc_id: DocId,
}

/// How many terms `InvertedIndex::retain_index_terms` dropped, and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub non_alphabetic: usize,
    pub too_short: usize,
    pub kept: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(doc_id, raw_text)` pairs. Text is normalized here.
    pub fn build<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = (DocId, &'a str)>,
    {
        let mut index = Self::new();
        for (doc_id, text) in docs {
            index.add_document(doc_id, text);
        }
        index.finish();
        index
    }

    /// Add every token occurrence of `text` as a posting. Call `finish` once done.
    pub fn add_document(&mut self, doc_id: DocId, text: &str) -> usize {
        self.last_doc_id = self.last_doc_id.max(doc_id);
        let normalized = normalize(text);
        let mut count = 0;
        for token in tokens(&normalized) {
            match self.postings.get_mut(token) {
                Some(list) => list.push(doc_id),
                None => {
                    self.postings.insert(token.to_owned(), vec![doc_id]);
                }
            }
            count += 1;
        }
        count
    }

    /// Sort every posting list ascending.
    pub fn finish(&mut self) {
        for list in self.postings.values_mut() {
            list.sort_unstable();
            if let Some(&last) = list.last() {
                self.last_doc_id = self.last_doc_id.max(last);
            }
        }
    }

    /// Drop noise terms (digits, single letters) before matrix building.
    pub fn retain_index_terms(&mut self) -> FilterReport {
        let mut report = FilterReport::default();
        self.postings.retain(|term, _| {
            if !term.bytes().all(|b| b.is_ascii_alphabetic()) {
                report.non_alphabetic += 1;
                false
            } else if !is_index_term(term) {
                report.too_short += 1;
                false
            } else {
                report.kept += 1;
                true
            }
        });
        report
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Total postings, i.e. indexed token occurrences.
    pub fn total_postings(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    /// Highest record number added, which fixes the matrix column count.
    /// Filtering terms never lowers it, so every record keeps its column.
    pub fn max_doc_id(&self) -> Option<DocId> {
        (self.last_doc_id > 0).then_some(self.last_doc_id)
    }

    pub fn get(&self, term: &str) -> Option<&[DocId]> {
        self.postings.get(term).map(Vec::as_slice)
    }
}
