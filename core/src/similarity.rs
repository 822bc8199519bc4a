use sprs::CsVecView;

/// Score a document column against a query vector in the same term space.
pub trait Similarity {
    fn score(&self, doc: CsVecView<'_, f64>, query: CsVecView<'_, f64>) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(CsVecView<'_, f64>, CsVecView<'_, f64>) -> f64,
{
    fn score(&self, doc: CsVecView<'_, f64>, query: CsVecView<'_, f64>) -> f64 {
        self(doc, query)
    }
}

/// Dot product over the product of Euclidean norms; 0 when either vector is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Similarity for Cosine {
    fn score(&self, doc: CsVecView<'_, f64>, query: CsVecView<'_, f64>) -> f64 {
        let norms = (doc.dot(&doc) * query.dot(&query)).sqrt();
        if norms == 0.0 {
            return 0.0;
        }
        doc.dot(&query) / norms
    }
}

/// Plain inner product.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dot;

impl Similarity for Dot {
    fn score(&self, doc: CsVecView<'_, f64>, query: CsVecView<'_, f64>) -> f64 {
        doc.dot(&query)
    }
}
