use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Generation service returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Generation service returned an empty response")]
    EmptyResponse,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot register product inside existing product: {} (parent: {})", path.display(), parent.display())]
    Conflict { path: PathBuf, parent: PathBuf },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl ShelfError {
    /// Network-level failures, i.e. anything a retry by the caller might fix.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ShelfError::Http(_)
                | ShelfError::UnexpectedStatus { .. }
                | ShelfError::Timeout { .. }
                | ShelfError::Upstream { .. }
                | ShelfError::EmptyResponse
        )
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
