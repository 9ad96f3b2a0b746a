// src/main.rs
use clap::Parser;
use sec_statements::utils::{logging, AppConfig, AppError};
use sec_statements::{pipeline, RunOptions};
use std::path::PathBuf;

/// Extract the income statement, cash flow statement and balance sheet from a company's latest 10-K
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company (defaults to `default_ticker` from the configuration)
    ticker: Option<String>,

    /// JSON configuration file with `headers` and `default_ticker`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for the CSV files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Debug mode - save the raw and annotated filing HTML under <output_dir>/debug
    #[arg(short, long)]
    debug: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Reads RUST_LOG
    logging::setup_logging(args.verbose);
    tracing::debug!("Starting processing for args: {:?}", args);

    let config = AppConfig::load(args.config.as_deref()).inspect_err(|e| tracing::error!("{}", e))?;
    let ticker = args.ticker.unwrap_or_else(|| config.default_ticker.clone());

    let options = RunOptions { output_dir: args.output_dir, debug: args.debug };

    match pipeline::run(&config, &ticker, &options).await {
        Ok(output) => {
            tracing::info!(
                "Latest 10-K accession number for {}: {}",
                output.filing.ticker,
                output.filing.accession_number
            );
            for path in &output.files {
                println!("{}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to process latest 10-K for {}: {}", ticker, e);
            Err(e)
        }
    }
}
