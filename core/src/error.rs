use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    /// Well-formed XML whose content does not fit the corpus/query layout.
    #[error("corpus error in {}: {message}", path.display())]
    Corpus { path: PathBuf, message: String },

    /// A row of a `;`-separated artifact that cannot be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Table {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("model error in {}: {message}", path.display())]
    Model { path: PathBuf, message: String },

    #[error("model encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error in {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Every required key absent from the config file, reported together.
    #[error("missing required config keys in {}: {}", path.display(), keys.join(", "))]
    MissingConfig { path: PathBuf, keys: Vec<String> },
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn xml(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Error::Xml { path: path.as_ref().to_path_buf(), message: message.to_string() }
    }

    pub fn corpus(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Corpus { path: path.as_ref().to_path_buf(), message: message.into() }
    }

    pub fn table(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Error::Table { path: path.as_ref().to_path_buf(), line, message: message.into() }
    }

    pub fn model(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Model { path: path.as_ref().to_path_buf(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_lists_every_key() {
        let err = Error::MissingConfig {
            path: PathBuf::from("pipeline.toml"),
            keys: vec!["index.input".into(), "search.model".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required config keys in pipeline.toml: index.input, search.model"
        );
    }
}
