// src/utils/mod.rs
pub mod config;
pub mod error;
pub mod html_debug;
pub mod logging;

pub use config::AppConfig;
pub use error::AppError; // Re-export main error type for convenience
