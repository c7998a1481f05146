use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A CSV row whose title or year could not be read. Absorbed by the
    /// importer and only ever reported as a count.
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: u64, reason: String },

    #[error("Unknown keyword group: {0}")]
    UnknownGroup(String),

    #[error("Keyword group name already in use: {0}")]
    NameCollision(String),

    #[error("Embedding backend unavailable: {0}")]
    MissingCapability(String),

    #[error("Database unavailable at {}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    // Storage engine text stays in the source chain, not in the message.
    #[error("Database operation failed")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A pipeline stage was invoked before the stage it depends on.
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
