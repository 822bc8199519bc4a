//! Stage artifacts on disk.
//!
//! Tables are `;`-separated with a header row; list cells are JSON arrays. The
//! model is one bincode blob. Every artifact is written to a sibling `.tmp` file
//! and renamed into place, so a failed stage never leaves a partial artifact.

use serde::{Deserialize, Serialize};
use sprs::CsMat;
use std::fs::{self, create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::corpus::Judgment;
use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex};
use crate::matrix::Vocabulary;
use crate::model::Model;
use crate::query::QueryResult;

pub const MODEL_VERSION: u32 = 1;

const INVERTED_HEADER: &str = "Term;RecordNums";
const QUERIES_HEADER: &str = "QueryNumber;QueryText";
const EXPECTED_HEADER: &str = "QueryNumber;DocNumber;DocVotes";
const RESULTS_HEADER: &str = "QueryNumber;Result";

#[derive(Serialize)]
struct ModelFileRef<'a> {
    version: u32,
    weights: &'a CsMat<f64>,
    vocabulary: &'a Vocabulary,
}

#[derive(Deserialize)]
struct ModelFile {
    version: u32,
    weights: CsMat<f64>,
    vocabulary: Vocabulary,
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `path`'s temporary sibling and return it. The temporary file is
/// removed again if `write` fails.
fn stage<F>(path: &Path, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let tmp = tmp_path(path);
    let written = File::create(&tmp)
        .map_err(|e| Error::io(&tmp, e))
        .and_then(|f| {
            let mut w = BufWriter::new(f);
            write(&mut w)?;
            w.flush().map_err(|e| Error::io(&tmp, e))
        });
    match written {
        Ok(()) => Ok(tmp),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Write through a temporary file, then rename over `path`.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = stage(path, write)?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

fn write_table<I>(w: &mut BufWriter<File>, path: &Path, header: &str, lines: I) -> Result<()>
where
    I: IntoIterator<Item = Result<String>>,
{
    writeln!(w, "{header}").map_err(|e| Error::io(path, e))?;
    for line in lines {
        writeln!(w, "{}", line?).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

fn write_lines<I>(path: &Path, header: &str, lines: I) -> Result<()>
where
    I: IntoIterator<Item = Result<String>>,
{
    write_atomic(path, |w| write_table(w, path, header, lines))
}

/// Data rows of a table as `(line_number, line)`, header checked and skipped.
fn read_rows(path: &Path, header: &str) -> Result<Vec<(usize, String)>> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut lines = BufReader::new(f).lines();
    match lines.next() {
        Some(Ok(first)) if first.trim_end() == header => {}
        Some(Err(e)) => return Err(Error::io(path, e)),
        _ => return Err(Error::table(path, 1, format!("expected header {header:?}"))),
    }
    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if !line.trim().is_empty() {
            rows.push((i + 2, line));
        }
    }
    Ok(rows)
}

fn split_row<'a>(path: &Path, line_no: usize, line: &'a str, fields: usize) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = line.splitn(fields, ';').collect();
    if parts.len() != fields {
        return Err(Error::table(path, line_no, format!("expected {fields} fields")));
    }
    Ok(parts)
}

pub fn save_inverted_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    let lines = index
        .postings
        .iter()
        .map(|(term, ids)| -> Result<String> {
            Ok(format!("{term};{}", serde_json::to_string(ids)?))
        });
    write_lines(path, INVERTED_HEADER, lines)
}

pub fn load_inverted_index(path: &Path) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    for (line_no, line) in read_rows(path, INVERTED_HEADER)? {
        let parts = split_row(path, line_no, &line, 2)?;
        let ids: Vec<DocId> = serde_json::from_str(parts[1])
            .map_err(|e| Error::table(path, line_no, format!("bad posting list: {e}")))?;
        if ids.contains(&0) {
            return Err(Error::table(path, line_no, "record number 0 in posting list"));
        }
        index.postings.insert(parts[0].to_owned(), ids);
    }
    index.finish();
    Ok(index)
}

pub fn save_model(path: &Path, model: &Model) -> Result<()> {
    let file = ModelFileRef {
        version: MODEL_VERSION,
        weights: &model.weights,
        vocabulary: &model.vocabulary,
    };
    write_atomic(path, |w| {
        bincode::serialize_into(w, &file)?;
        Ok(())
    })
}

pub fn load_model(path: &Path) -> Result<Model> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let file: ModelFile = bincode::deserialize_from(BufReader::new(f))
        .map_err(|e| Error::model(path, e.to_string()))?;
    if file.version != MODEL_VERSION {
        return Err(Error::model(
            path,
            format!("unsupported model version {} (expected {MODEL_VERSION})", file.version),
        ));
    }
    let model = Model { weights: file.weights.to_csc(), vocabulary: file.vocabulary };
    model.validate().map_err(|m| Error::model(path, m))?;
    Ok(model)
}

fn query_lines(queries: &[(u32, String)]) -> impl Iterator<Item = Result<String>> + '_ {
    queries.iter().map(|(n, text)| Ok(format!("{n};{text}")))
}

fn expected_lines(rows: &[(u32, Judgment)]) -> impl Iterator<Item = Result<String>> + '_ {
    rows.iter().map(|(q, j)| Ok(format!("{q};{};{}", j.doc_id, j.votes)))
}

/// Queries table rows are `(QueryNumber, normalized QueryText)`.
pub fn save_queries(path: &Path, queries: &[(u32, String)]) -> Result<()> {
    write_lines(path, QUERIES_HEADER, query_lines(queries))
}

/// Write the queries and expected tables as a pair. Both are staged before
/// either is renamed into place, so a failed write leaves neither behind.
pub fn save_query_tables(
    queries_path: &Path,
    queries: &[(u32, String)],
    expected_path: &Path,
    expected: &[(u32, Judgment)],
) -> Result<()> {
    let queries_tmp = stage(queries_path, |w| {
        write_table(w, queries_path, QUERIES_HEADER, query_lines(queries))
    })?;
    let expected_tmp = match stage(expected_path, |w| {
        write_table(w, expected_path, EXPECTED_HEADER, expected_lines(expected))
    }) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = fs::remove_file(&queries_tmp);
            return Err(e);
        }
    };
    fs::rename(&queries_tmp, queries_path).map_err(|e| Error::io(queries_path, e))?;
    fs::rename(&expected_tmp, expected_path).map_err(|e| Error::io(expected_path, e))
}

pub fn load_queries(path: &Path) -> Result<Vec<(u32, String)>> {
    read_rows(path, QUERIES_HEADER)?
        .into_iter()
        .map(|(line_no, line)| -> Result<(u32, String)> {
            let parts = split_row(path, line_no, &line, 2)?;
            let number = parts[0]
                .trim()
                .parse()
                .map_err(|_| Error::table(path, line_no, "QueryNumber is not a number"))?;
            Ok((number, parts[1].to_owned()))
        })
        .collect()
}

pub fn save_expected(path: &Path, rows: &[(u32, Judgment)]) -> Result<()> {
    write_lines(path, EXPECTED_HEADER, expected_lines(rows))
}

pub fn load_expected(path: &Path) -> Result<Vec<(u32, Judgment)>> {
    read_rows(path, EXPECTED_HEADER)?
        .into_iter()
        .map(|(line_no, line)| -> Result<(u32, Judgment)> {
            let parts = split_row(path, line_no, &line, 3)?;
            let num = |s: &str| {
                s.trim()
                    .parse::<u32>()
                    .map_err(|_| Error::table(path, line_no, format!("not a number: {s:?}")))
            };
            Ok((num(parts[0])?, Judgment { doc_id: num(parts[1])?, votes: num(parts[2])? }))
        })
        .collect()
}

pub fn save_results(path: &Path, results: &[QueryResult]) -> Result<()> {
    let lines = results
        .iter()
        .map(|r| -> Result<String> {
            Ok(format!("{};{}", r.query_number, serde_json::to_string(&r.to_triples())?))
        });
    write_lines(path, RESULTS_HEADER, lines)
}

pub fn load_results(path: &Path) -> Result<Vec<QueryResult>> {
    read_rows(path, RESULTS_HEADER)?
        .into_iter()
        .map(|(line_no, line)| -> Result<QueryResult> {
            let parts = split_row(path, line_no, &line, 2)?;
            let number = parts[0]
                .trim()
                .parse()
                .map_err(|_| Error::table(path, line_no, "QueryNumber is not a number"))?;
            let triples = serde_json::from_str(parts[1])
                .map_err(|e| Error::table(path, line_no, format!("bad ranking: {e}")))?;
            Ok(QueryResult::from_triples(number, triples))
        })
        .collect()
}
