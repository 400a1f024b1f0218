//! Error types for Vantage

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insight error: {0}")]
    Insight(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backup error: {0}")]
    Backup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
