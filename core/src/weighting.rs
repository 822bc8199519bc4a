//! Weighting transforms: raw term-document counts in, same-shape weights out.
//!
//! Any `Fn(&CsMat<f64>) -> CsMat<f64>` is a [`Weighting`], so alternative schemes
//! can be passed where [`TfIdf`] is expected without touching the index side.

use sprs::CsMat;

pub trait Weighting {
    fn apply(&self, counts: &CsMat<f64>) -> CsMat<f64>;
}

impl<F> Weighting for F
where
    F: Fn(&CsMat<f64>) -> CsMat<f64>,
{
    fn apply(&self, counts: &CsMat<f64>) -> CsMat<f64> {
        self(counts)
    }
}

/// Column-normalized term frequency scaled by per-row inverse document frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdf {
    /// Use `ln(1 + N/df)` instead of `ln(N/df)`; ubiquitous terms keep a small weight.
    pub smoothed_idf: bool,
}

impl TfIdf {
    pub fn smoothed() -> Self {
        Self { smoothed_idf: true }
    }
}

impl Weighting for TfIdf {
    fn apply(&self, counts: &CsMat<f64>) -> CsMat<f64> {
        let idf = inverse_document_frequency(counts, self.smoothed_idf);
        scale_rows(&term_frequency(counts), &idf)
    }
}

/// Divide each column by its sum. Empty columns stay empty instead of turning NaN.
pub fn term_frequency(counts: &CsMat<f64>) -> CsMat<f64> {
    let mut tf = counts.to_csc();
    for mut col in tf.outer_iterator_mut() {
        let total: f64 = col.iter().map(|(_, v)| *v).sum();
        if total > 0.0 {
            for (_, v) in col.iter_mut() {
                *v /= total;
            }
        }
    }
    tf
}

/// `ln(N / df)` per row, where `df` counts columns with a non-zero entry.
/// Rows with no occurrence get 0.
pub fn inverse_document_frequency(counts: &CsMat<f64>, smoothed: bool) -> Vec<f64> {
    let n = counts.cols() as f64;
    let mut df = vec![0usize; counts.rows()];
    for (&v, (row, _)) in counts.iter() {
        if v != 0.0 {
            df[row] += 1;
        }
    }
    df.into_iter()
        .map(|d| match d {
            0 => 0.0,
            d if smoothed => (1.0 + n / d as f64).ln(),
            d => (n / d as f64).ln(),
        })
        .collect()
}

/// Multiply every entry by its row factor, keeping the sparsity structure.
pub fn scale_rows(m: &CsMat<f64>, factors: &[f64]) -> CsMat<f64> {
    let mut out = m.to_csc();
    for mut col in out.outer_iterator_mut() {
        for (row, v) in col.iter_mut() {
            *v *= factors[row];
        }
    }
    out
}
