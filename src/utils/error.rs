// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("No 10-K filing found for {ticker} (CIK {cik})")]
    NoFilingFound { ticker: String, cik: u64 },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status} for URL: {url}")]
    Http { status: reqwest::StatusCode, url: String }, // e.g., 404 Not Found, 403 Forbidden

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

impl EdgarError {
    /// True for transport failures and non-success statuses, i.e. the fetch step itself failed.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, EdgarError::Network(_) | EdgarError::Http { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Could not parse rows from {section}: {reason}")]
    Parse { section: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed value {value:?} in {path}")]
    Read { path: PathBuf, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
