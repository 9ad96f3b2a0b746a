// src/extractors/mod.rs
pub mod statements;
pub mod value;

// Re-export key extraction types for convenience
pub use statements::{
    extract_statements,
    ExtractionRule,
    FinancialStatements,
    KeyLineItem,
    LineItem,
    StatementKind,
    StatementTable,
};
