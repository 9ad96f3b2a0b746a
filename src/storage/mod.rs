// src/storage/mod.rs
use crate::extractors::statements::{FinancialStatements, LineItem, StatementTable};
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

const HEADER: [&str; 2] = ["label", "value"];

/// Writes statement tables as `label,value` CSV files into one directory.
#[derive(Debug, Clone)]
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|source| StorageError::Write { path: base_path.clone(), source })?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// `{base_dir}/{TICKER}_{statement}.csv`
    pub fn statement_path(&self, ticker: &str, table: &StatementTable) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.csv", ticker.to_uppercase(), table.kind.file_stem()))
    }

    /// Writes all three statements, overwriting earlier runs, and returns the paths written.
    pub fn save_statements(
        &self,
        ticker: &str,
        statements: &FinancialStatements,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut written = Vec::with_capacity(3);
        for table in statements.tables() {
            let path = self.statement_path(ticker, table);
            write_csv(table, &path)?;
            tracing::info!(
                "Saved {} ({} line items) to {}",
                table.kind.name(),
                table.len(),
                path.display()
            );
            written.push(path);
        }
        Ok(written)
    }
}

/// Shortest decimal form: `-1234`, `6.08`; null is an empty field.
fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `table` to `path` as a two-column CSV with a `label,value` header, replacing any existing file.
pub fn write_csv(table: &StatementTable, path: &Path) -> Result<(), StorageError> {
    let write_err = |source| StorageError::Write { path: path.to_path_buf(), source };
    let csv_err = |source| StorageError::Csv { path: path.to_path_buf(), source };

    let file = fs::File::create(path).map_err(write_err)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADER).map_err(csv_err)?;
    for item in &table.items {
        writer
            .write_record([item.label.as_str(), format_value(item.value).as_str()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(write_err)?;
    Ok(())
}

/// Reads a file produced by [`write_csv`] back into ordered line items.
pub fn read_csv(path: &Path) -> Result<Vec<LineItem>, StorageError> {
    let csv_err = |source| StorageError::Csv { path: path.to_path_buf(), source };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let label = record.get(0).unwrap_or_default().to_string();
        let raw = record.get(1).unwrap_or_default();
        let value = if raw.is_empty() {
            None
        } else {
            Some(raw.parse::<f64>().map_err(|_| StorageError::Read {
                path: path.to_path_buf(),
                value: raw.to_string(),
            })?)
        };
        items.push(LineItem { label, value });
    }
    Ok(items)
}
