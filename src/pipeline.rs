// src/pipeline.rs
use crate::edgar::{EdgarClient, FilingReference};
use crate::extractors::{extract_statements, FinancialStatements};
use crate::storage::StorageManager;
use crate::utils::{html_debug, AppConfig, AppError};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory receiving the CSV files
    pub output_dir: PathBuf,
    /// Also save the raw filing and an annotated copy
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("."), debug: false }
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub filing: FilingReference,
    pub statements: FinancialStatements,
    pub files: Vec<PathBuf>,
}

/// Locate → fetch → extract → write, one step after the other.
///
/// Nothing is written to `output_dir` unless every step before the writer succeeded.
pub async fn run(config: &AppConfig, ticker: &str, options: &RunOptions) -> Result<PipelineOutput, AppError> {
    let client = EdgarClient::new(config)?;

    tracing::info!("Finding latest 10-K filing for ticker: {}", ticker);
    let filing = client.locate_latest_filing(ticker).await?;
    tracing::info!(
        "Processing {} 10-K filed {} ({})",
        filing.company_name,
        filing.filing_date,
        filing.accession_number
    );

    let document = client.fetch_document(&filing).await?;

    let extracted = extract_statements(&document.html);
    if options.debug {
        let debug_dir = options.output_dir.join("debug");
        if let Err(e) = html_debug::save_debug_files(&document.html, &debug_dir, &filing.ticker) {
            tracing::warn!("Failed to create debug HTML: {}", e);
        }
    }
    let statements = extracted.inspect_err(|e| tracing::error!("No statements read from {}: {}", document.url, e))?;

    let storage = StorageManager::new(&options.output_dir)?;
    let files = storage.save_statements(&filing.ticker, &statements)?;

    tracing::info!("Financial statements saved as CSV files for {}", filing.ticker);
    Ok(PipelineOutput { filing, statements, files })
}
