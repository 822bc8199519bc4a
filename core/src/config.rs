//! Pipeline configuration.
//!
//! One TOML file holds a section per stage:
//!
//! ```toml
//! [queries]
//! input = "data/cfquery.xml"
//! queries = "out/queries.csv"
//! expected = "out/expected.csv"
//!
//! [invert]
//! inputs = ["data/cf74.xml", "data/cf75.xml"]
//! output = "out/inverted.csv"
//!
//! [index]
//! input = "out/inverted.csv"
//! output = "out/model.bin"
//!
//! [search]
//! model = "out/model.bin"
//! queries = "out/queries.csv"
//! results = "out/results.csv"
//! ```
//!
//! File types are all `Option` so that a missing key is not a parse error; the
//! typed stage configs are produced by validation, which reports every missing
//! key at once. Relative paths resolve against the config file's directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub queries: Option<QueriesSection>,
    #[serde(default)]
    pub invert: Option<InvertSection>,
    #[serde(default)]
    pub index: Option<IndexSection>,
    #[serde(default)]
    pub search: Option<SearchSection>,
    #[serde(skip)]
    source: PathBuf,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueriesSection {
    pub input: Option<PathBuf>,
    pub queries: Option<PathBuf>,
    pub expected: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct InvertSection {
    pub inputs: Option<Vec<PathBuf>>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct IndexSection {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchSection {
    pub model: Option<PathBuf>,
    pub queries: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

/// Query processor: query XML in, queries and expected tables out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueriesConfig {
    pub input: PathBuf,
    pub queries: PathBuf,
    pub expected: PathBuf,
}

/// Inverted list generator: corpus XML files in (concatenated in order), list out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Model builder: inverted list in, model blob out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Searcher: model and queries table in, results table out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub model: PathBuf,
    pub queries: PathBuf,
    pub results: PathBuf,
}

/// Every stage, validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub queries: QueriesConfig,
    pub invert: InvertConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
}

/// Collects missing keys while pulling required values out of a section.
struct Required<'a> {
    base: &'a Path,
    missing: Vec<String>,
}

impl<'a> Required<'a> {
    fn new(base: &'a Path) -> Self {
        Self { base, missing: Vec::new() }
    }

    fn path(&mut self, key: &str, value: Option<&PathBuf>) -> PathBuf {
        match value {
            Some(p) if !p.as_os_str().is_empty() => resolve(self.base, p),
            _ => {
                self.missing.push(key.to_owned());
                PathBuf::new()
            }
        }
    }

    fn paths(&mut self, key: &str, value: Option<&Vec<PathBuf>>) -> Vec<PathBuf> {
        match value {
            Some(list) if !list.is_empty() => list.iter().map(|p| resolve(self.base, p)).collect(),
            _ => {
                self.missing.push(key.to_owned());
                Vec::new()
            }
        }
    }

    fn finish<T>(self, source: &Path, value: T) -> Result<T> {
        if self.missing.is_empty() {
            Ok(value)
        } else {
            Err(Error::MissingConfig { path: source.to_path_buf(), keys: self.missing })
        }
    }
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

impl PipelineFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut file = Self::parse(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        file.source = path.to_path_buf();
        Ok(file)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn base_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    fn queries_with(&self, req: &mut Required<'_>) -> QueriesConfig {
        let s = self.queries.clone().unwrap_or_default();
        QueriesConfig {
            input: req.path("queries.input", s.input.as_ref()),
            queries: req.path("queries.queries", s.queries.as_ref()),
            expected: req.path("queries.expected", s.expected.as_ref()),
        }
    }

    fn invert_with(&self, req: &mut Required<'_>) -> InvertConfig {
        let s = self.invert.clone().unwrap_or_default();
        InvertConfig {
            inputs: req.paths("invert.inputs", s.inputs.as_ref()),
            output: req.path("invert.output", s.output.as_ref()),
        }
    }

    fn index_with(&self, req: &mut Required<'_>) -> IndexConfig {
        let s = self.index.clone().unwrap_or_default();
        IndexConfig {
            input: req.path("index.input", s.input.as_ref()),
            output: req.path("index.output", s.output.as_ref()),
        }
    }

    fn search_with(&self, req: &mut Required<'_>) -> SearchConfig {
        let s = self.search.clone().unwrap_or_default();
        SearchConfig {
            model: req.path("search.model", s.model.as_ref()),
            queries: req.path("search.queries", s.queries.as_ref()),
            results: req.path("search.results", s.results.as_ref()),
        }
    }

    pub fn queries_config(&self) -> Result<QueriesConfig> {
        let mut req = Required::new(self.base_dir());
        let cfg = self.queries_with(&mut req);
        req.finish(&self.source, cfg)
    }

    pub fn invert_config(&self) -> Result<InvertConfig> {
        let mut req = Required::new(self.base_dir());
        let cfg = self.invert_with(&mut req);
        req.finish(&self.source, cfg)
    }

    pub fn index_config(&self) -> Result<IndexConfig> {
        let mut req = Required::new(self.base_dir());
        let cfg = self.index_with(&mut req);
        req.finish(&self.source, cfg)
    }

    pub fn search_config(&self) -> Result<SearchConfig> {
        let mut req = Required::new(self.base_dir());
        let cfg = self.search_with(&mut req);
        req.finish(&self.source, cfg)
    }

    /// Validate every section at once, listing all missing keys in one error.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut req = Required::new(self.base_dir());
        let cfg = PipelineConfig {
            queries: self.queries_with(&mut req),
            invert: self.invert_with(&mut req),
            index: self.index_with(&mut req),
            search: self.search_with(&mut req),
        };
        req.finish(&self.source, cfg)
    }
}
