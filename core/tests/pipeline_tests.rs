use std::fs;
use std::path::Path;

use tempfile::tempdir;
use vsm_core::config::PipelineFile;
use vsm_core::persist::{load_expected, load_inverted_index, load_model, load_queries};
use vsm_core::pipeline::{build_model, generate_inverted_list, process_queries};
use vsm_core::{Error, TfIdf};

const CF74: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <RECORD>
    <RECORDNUM>00001</RECORDNUM>
    <TITLE>Lung disease</TITLE>
    <ABSTRACT>Cystic fibrosis affects the lung; 12 patients, lung function.</ABSTRACT>
  </RECORD>
  <RECORD>
    <RECORDNUM>00002</RECORDNUM>
    <TITLE>Sweat test</TITLE>
    <EXTRACT>Sweat chloride in cystic fibrosis.</EXTRACT>
  </RECORD>
</root>"#;

const CF75: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <RECORD>
    <RECORDNUM>00003</RECORDNUM>
    <TITLE>Pancreatic enzymes</TITLE>
  </RECORD>
  <RECORD>
    <RECORDNUM>00004</RECORDNUM>
    <AUTHORS><AUTHOR>Nobody</AUTHOR></AUTHORS>
  </RECORD>
  <RECORD>
    <RECORDNUM>00005</RECORDNUM>
    <TITLE>Lung transplant</TITLE>
  </RECORD>
  <RECORD>
    <RECORDNUM>00006</RECORDNUM>
    <TITLE>1999 x</TITLE>
  </RECORD>
</root>"#;

const QUERIES: &str = r#"<FILEQUERY>
  <QUERY>
    <QueryNumber>00002</QueryNumber>
    <QueryText>Sweat chloride test?</QueryText>
    <Results>1</Results>
    <Records><Item score="2222">2</Item></Records>
  </QUERY>
  <QUERY>
    <QueryNumber>00001</QueryNumber>
    <QueryText>What is the effect of cystic fibrosis on the lung?</QueryText>
    <Results>2</Results>
    <Records><Item score="0011">2</Item><Item score="2212">1</Item></Records>
  </QUERY>
</FILEQUERY>"#;

const CONFIG: &str = r#"
[queries]
input = "data/cfquery.xml"
queries = "out/queries.csv"
expected = "out/expected.csv"

[invert]
inputs = ["data/cf74.xml", "data/cf75.xml"]
output = "out/inverted.csv"

[index]
input = "out/inverted.csv"
output = "out/model.bin"

[search]
model = "out/model.bin"
queries = "out/queries.csv"
results = "out/results.csv"
"#;

fn workspace(dir: &Path) -> PipelineFile {
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/cf74.xml"), CF74).unwrap();
    fs::write(dir.join("data/cf75.xml"), CF75).unwrap();
    fs::write(dir.join("data/cfquery.xml"), QUERIES).unwrap();
    fs::write(dir.join("pipeline.toml"), CONFIG).unwrap();
    PipelineFile::load(&dir.join("pipeline.toml")).unwrap()
}

#[test]
fn query_stage_writes_sorted_tables() {
    let dir = tempdir().unwrap();
    let cfg = workspace(dir.path()).queries_config().unwrap();
    let report = process_queries(&cfg).unwrap();
    assert_eq!((report.queries, report.judgments), (2, 3));

    let queries = load_queries(&cfg.queries).unwrap();
    assert_eq!(queries[0], (1, "WHAT IS THE EFFECT OF CYSTIC FIBROSIS ON THE LUNG".to_string()));
    assert_eq!(queries[1], (2, "SWEAT CHLORIDE TEST".to_string()));

    let expected = load_expected(&cfg.expected).unwrap();
    let flat: Vec<(u32, u32, u32)> = expected.iter().map(|(q, j)| (*q, j.doc_id, j.votes)).collect();
    assert_eq!(flat, vec![(1, 1, 7), (1, 2, 2), (2, 2, 8)]);
}

#[test]
fn inverted_list_concatenates_corpus_files() {
    let dir = tempdir().unwrap();
    let cfg = workspace(dir.path()).invert_config().unwrap();
    let index = generate_inverted_list(&cfg).unwrap();
    assert_eq!(index.get("LUNG"), Some(&[1, 1, 5][..]));
    assert_eq!(index.get("FIBROSIS"), Some(&[1, 2][..]));
    assert_eq!(index.get("ENZYMES"), Some(&[3][..]));
    assert_eq!(index.get("12"), Some(&[1][..]));
    assert_eq!(load_inverted_index(&cfg.output).unwrap(), index);
}

#[test]
fn model_stage_filters_and_weights() {
    let dir = tempdir().unwrap();
    let file = workspace(dir.path());
    generate_inverted_list(&file.invert_config().unwrap()).unwrap();
    let cfg = file.index_config().unwrap();
    let model = build_model(&cfg, &TfIdf::default()).unwrap();

    assert!(model.vocabulary.contains_key("LUNG"));
    assert!(!model.vocabulary.contains_key("12"));
    // record 6 only has filtered terms but keeps its column
    assert_eq!(model.n_docs(), 6);
    // record 4 has no text: its column is empty
    assert_eq!(model.weights.outer_view(3).map(|c| c.nnz()), Some(0));
    assert_eq!(model.weights.outer_view(5).map(|c| c.nnz()), Some(0));
    assert!(model.weights.data().iter().all(|v| v.is_finite()));
    assert_eq!(load_model(&cfg.output).unwrap(), model);
}

#[test]
fn stages_are_idempotent() {
    let dir = tempdir().unwrap();
    let file = workspace(dir.path());
    let out = dir.path().join("out");
    let snapshot = || {
        ["queries.csv", "expected.csv", "inverted.csv", "model.bin"]
            .map(|name| fs::read(out.join(name)).unwrap())
    };

    let run = || {
        process_queries(&file.queries_config().unwrap()).unwrap();
        generate_inverted_list(&file.invert_config().unwrap()).unwrap();
        build_model(&file.index_config().unwrap(), &TfIdf::default()).unwrap();
    };
    run();
    let first = snapshot();
    run();
    assert_eq!(first, snapshot());
}

#[test]
fn unreadable_corpus_aborts_without_output() {
    let dir = tempdir().unwrap();
    let file = workspace(dir.path());
    fs::write(dir.path().join("data/cf75.xml"), "<root><RECORD><RECORDNUM>3</RECORDNUM></TITLE></root>").unwrap();
    let cfg = file.invert_config().unwrap();
    let err = generate_inverted_list(&cfg).unwrap_err();
    assert!(matches!(err, Error::Xml { .. }), "{err}");
    assert!(!cfg.output.exists());

    fs::remove_file(dir.path().join("data/cf74.xml")).unwrap();
    assert!(matches!(generate_inverted_list(&cfg), Err(Error::Io { .. })));
}

#[test]
fn query_stage_failure_writes_neither_table() {
    let dir = tempdir().unwrap();
    let mut cfg = workspace(dir.path()).queries_config().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    cfg.expected = blocker.join("expected.csv");

    assert!(matches!(process_queries(&cfg), Err(Error::Io { .. })));
    assert!(!cfg.queries.exists());
}
