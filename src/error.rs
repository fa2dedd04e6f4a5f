use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("type source not found: {}", .0.display())]
    TypeSourceNotFound(PathBuf),
    #[error("type `{name}` is not exported by {}", .source_path.display())]
    TypeNotFound { name: String, source_path: PathBuf },
    #[error("invalid type module {}: {message}", .path.display())]
    TypeModule { path: PathBuf, message: String },
    #[error("external checker failed: {0}")]
    Checker(String),
    #[error("invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
