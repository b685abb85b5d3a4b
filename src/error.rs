use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid table JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tax brackets: {0}")]
    InvalidBrackets(String),
    #[error("invalid life-event impact for {tag:?}: {value}")]
    InvalidImpact { tag: String, value: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid household record: {0}")]
    Record(#[source] serde_json::Error),
    #[error("{0}")]
    InvalidInput(String),
    #[error("failed to write output: {0}")]
    Output(#[source] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}
