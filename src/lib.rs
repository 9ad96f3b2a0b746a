// src/lib.rs
//! Pulls the latest 10-K for a ticker from SEC EDGAR and writes its income statement,
//! cash flow statement and balance sheet as `label,value` CSV files.

pub mod edgar;
pub mod extractors;
pub mod pipeline;
pub mod storage;
pub mod utils;

pub use edgar::{EdgarClient, FilingReference, RawDocument};
pub use extractors::{extract_statements, FinancialStatements, KeyLineItem, LineItem, StatementKind, StatementTable};
pub use pipeline::{run, PipelineOutput, RunOptions};
pub use storage::{read_csv, write_csv, StorageManager};
pub use utils::{AppConfig, AppError};
