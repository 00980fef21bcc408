use std::path::PathBuf;

use thiserror::Error;

/// Error kinds surfaced by the resume generation pipeline. Everything except
/// transient HTTP/API overload (retried internally) aborts the current run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("completion API: {0}")]
    Completion(String),

    #[error("malformed model output: {0}")]
    ModelOutputFormat(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
