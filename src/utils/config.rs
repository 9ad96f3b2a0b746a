// src/utils/config.rs
use crate::utils::error::AppError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable that replaces the configured `User-Agent` header.
pub const USER_AGENT_ENV: &str = "EDGAR_USER_AGENT";

// SEC asks for "Company Name admin@domain" style identification.
const DEFAULT_USER_AGENT: &str = "sec_statements admin@example.com";
const DEFAULT_TICKER: &str = "AAPL";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration, passed explicitly into the client and the pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Headers attached to every outbound request. Must carry a `User-Agent`.
    pub headers: BTreeMap<String, String>,
    /// Ticker used when none is given on the command line.
    pub default_ticker: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub urls: EdgarUrls,
}

/// Base URLs for the EDGAR endpoints the pipeline talks to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdgarUrls {
    /// Ticker → CIK mapping JSON
    pub tickers: String,
    /// Directory holding `CIK##########.json` submission indexes
    pub submissions: String,
    /// Root of `/{cik}/{accession}/{document}` archive paths
    pub archives: String,
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            tickers: "https://www.sec.gov/files/company_tickers.json".to_string(),
            submissions: "https://data.sec.gov/submissions".to_string(),
            archives: "https://www.sec.gov/Archives/edgar/data".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        Self {
            headers,
            default_ticker: DEFAULT_TICKER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            urls: EdgarUrls::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from a JSON file, or the built-in defaults when no path is given.
    /// `EDGAR_USER_AGENT`, if set, replaces the configured `User-Agent`.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                let raw = std::fs::read_to_string(path)?;
                Self::from_json_str(&raw)?
            }
            None => {
                tracing::debug!("No configuration file given, using defaults");
                Self::default()
            }
        };

        let config = config.with_user_agent_override(std::env::var(USER_AGENT_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid configuration file: {}", e)))
    }

    /// Replaces the `User-Agent` header (matched case-insensitively) when `user_agent` is non-empty.
    pub fn with_user_agent_override(mut self, user_agent: Option<String>) -> Self {
        if let Some(user_agent) = user_agent.filter(|ua| !ua.trim().is_empty()) {
            self.headers.retain(|name, _| !name.eq_ignore_ascii_case("user-agent"));
            self.headers.insert("User-Agent".to_string(), user_agent);
        }
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.as_str())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the invariants the EDGAR access policy and the CLI rely on.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.user_agent() {
            Some(ua) if !ua.trim().is_empty() => {}
            _ => {
                return Err(AppError::Config(
                    "headers must include a non-empty User-Agent identifying the caller".to_string(),
                ))
            }
        }
        if self.default_ticker.trim().is_empty() {
            return Err(AppError::Config("default_ticker must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
