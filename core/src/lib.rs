//! Vector-space retrieval: normalize text, build an inverted index, turn it into
//! a weighted term-document matrix, and rank documents against queries.

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod matrix;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod similarity;
pub mod tokenizer;
pub mod weighting;

pub use error::{Error, Result};
pub use index::{DocId, InvertedIndex, TermId};
pub use matrix::{TermDocMatrix, Vocabulary};
pub use model::Model;
pub use query::{QueryEngine, QueryResult, RankedDoc};
pub use similarity::{Cosine, Dot, Similarity};
pub use weighting::{TfIdf, Weighting};
