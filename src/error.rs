use std::io;
use std::sync::mpsc;

use thiserror::Error;

/// Failures while fetching or parsing the salary table at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open '{source_name}': {cause}")]
    Io { source_name: String, cause: io::Error },
    #[error("request to '{url}' failed: {cause}")]
    Http { url: String, cause: reqwest::Error },
    #[error("request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed row near line {line}: {cause}")]
    Csv { line: u64, cause: csv::Error },
    #[error("'{0}' contains no rows")]
    Empty(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("dataset failed to load: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("input channel closed: {0}")]
    Input(#[from] mpsc::RecvError),
}
