use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vsm_core::tokenizer::normalize;
use vsm_core::{Cosine, InvertedIndex, Model, QueryEngine, TfIdf};

const ABSTRACT: &str = "The sweat chloride test remains the standard diagnostic procedure for \
cystic fibrosis (CF). Pulmonary function, pancreatic insufficiency & growth were \
followed in 112 patients; mucus hypersecretion, Pseudomonas aeruginosa infection and \
bronchiectasis were the main pulmonary findings. Résumé: fibrose cística, pâncreas.";

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_abstract", |b| b.iter(|| normalize(black_box(ABSTRACT))));
}

fn bench_cosine_ranking(c: &mut Criterion) {
    let words: Vec<&str> = ABSTRACT.split_whitespace().collect();
    let docs: Vec<(u32, String)> = (0..500u32)
        .map(|i| {
            let start = i as usize % words.len();
            let text = words.iter().cycle().skip(start).take(20).copied().collect::<Vec<_>>().join(" ");
            (i + 1, text)
        })
        .collect();
    let mut index = InvertedIndex::build(docs.iter().map(|(id, t)| (*id, t.as_str())));
    index.retain_index_terms();
    let model = Model::build(&index, &TfIdf::default());
    let engine = QueryEngine::new(model, [(1, "sweat chloride cystic fibrosis".to_string())]);

    c.bench_function("cosine_rank_500_docs", |b| b.iter(|| engine.run(black_box(&Cosine))));
}

criterion_group!(benches, bench_normalize, bench_cosine_ranking);
criterion_main!(benches);
