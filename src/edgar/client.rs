// src/edgar/client.rs
use crate::edgar::models::{CompanySubmission, CompanyTicker, FilingReference, RawDocument, ANNUAL_FORM};
use crate::utils::config::{AppConfig, EdgarUrls};
use crate::utils::error::EdgarError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const MAX_TICKER_LEN: usize = 10;

/// EDGAR HTTP client. Every request carries the configured identification headers.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    urls: EdgarUrls,
}

impl EdgarClient {
    /// Creates a reqwest client configured for EDGAR interaction from `config`.
    pub fn new(config: &AppConfig) -> Result<Self, EdgarError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| EdgarError::InvalidHeader(format!("{}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| EdgarError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        tracing::debug!("Using User-Agent: {:?}", config.user_agent());

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, urls: config.urls.clone() })
    }

    /// Issues a GET and turns any non-2xx status into `EdgarError::Http`.
    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, EdgarError> {
        let response = self.http.get(url).header(header::ACCEPT, accept).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check the User-Agent header.");
            }
            return Err(EdgarError::Http { status, url: url.to_string() });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, EdgarError> {
        let body = self.get(url, "application/json").await?.text().await?;
        serde_json::from_str(&body).map_err(|e| EdgarError::Parse(format!("{}: {}", url, e)))
    }

    /// Resolves a ticker to its issuer through the ticker mapping.
    pub async fn resolve_cik(&self, ticker: &str) -> Result<CompanyTicker, EdgarError> {
        let ticker = normalize_ticker(ticker)?;
        let mapping: HashMap<String, CompanyTicker> = self.get_json(&self.urls.tickers).await?;
        let issuer = find_issuer(mapping.values(), &ticker)?;
        tracing::info!("Resolved {} to CIK {} ({})", ticker, issuer.cik_str, issuer.title);
        Ok(issuer)
    }

    /// Fetches the company submission data for a given CIK
    pub async fn get_company_submissions(&self, cik: u64) -> Result<CompanySubmission, EdgarError> {
        let url = format!("{}/CIK{:010}.json", self.urls.submissions.trim_end_matches('/'), cik);
        self.get_json(&url).await
    }

    /// Finds the most recent 10-K for `ticker`.
    pub async fn locate_latest_filing(&self, ticker: &str) -> Result<FilingReference, EdgarError> {
        let ticker = normalize_ticker(ticker)?;
        let issuer = self.resolve_cik(&ticker).await?;
        let submissions = self.get_company_submissions(issuer.cik_str).await?;

        let latest = submissions
            .filings
            .recent
            .latest_annual()?
            .ok_or_else(|| {
                tracing::error!("No 10-K filings found for {}", ticker);
                EdgarError::NoFilingFound { ticker: ticker.clone(), cik: issuer.cik_str }
            })?;

        tracing::info!("Latest 10-K filing date: {}", latest.filing_date);
        tracing::info!("Accession number: {}", latest.accession_number);

        Ok(FilingReference {
            ticker,
            cik: issuer.cik_str,
            company_name: submissions.name,
            form_type: ANNUAL_FORM.to_string(),
            filing_date: latest.filing_date,
            accession_number: latest.accession_number.to_string(),
            primary_document: latest.primary_document.to_string(),
        })
    }

    /// Downloads the primary document of `filing`.
    pub async fn fetch_document(&self, filing: &FilingReference) -> Result<RawDocument, EdgarError> {
        let url = filing.primary_doc_url(&self.urls.archives);
        tracing::info!("Downloading document from: {}", url);

        // SEC uses various content types, but often text/html for filings
        let html = self
            .get(&url, "text/html,application/xhtml+xml,text/plain,*/*")
            .await?
            .text()
            .await?;
        tracing::info!("Successfully downloaded document ({} bytes)", html.len());

        Ok(RawDocument { url, html })
    }
}

/// Uppercases and validates a ticker symbol (letters, digits, `.` and `-`).
pub fn normalize_ticker(ticker: &str) -> Result<String, EdgarError> {
    let ticker = ticker.trim();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(EdgarError::UnknownTicker(ticker.to_string()));
    }
    Ok(ticker.to_ascii_uppercase())
}

/// Looks `ticker` up in the mapping; it must name exactly one CIK.
fn find_issuer<'a>(
    mapping: impl IntoIterator<Item = &'a CompanyTicker>,
    ticker: &str,
) -> Result<CompanyTicker, EdgarError> {
    let mut matches: Vec<&CompanyTicker> = mapping
        .into_iter()
        .filter(|company| company.ticker.eq_ignore_ascii_case(ticker))
        .collect();
    matches.sort_by_key(|company| company.cik_str);
    matches.dedup_by_key(|company| company.cik_str);

    match matches.as_slice() {
        [issuer] => Ok((*issuer).clone()),
        [] => Err(EdgarError::UnknownTicker(ticker.to_string())),
        many => {
            tracing::warn!("Ticker {} maps to {} different CIKs", ticker, many.len());
            Err(EdgarError::UnknownTicker(format!("{} (ambiguous)", ticker)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(cik: u64, ticker: &str, title: &str) -> CompanyTicker {
        CompanyTicker { cik_str: cik, ticker: ticker.to_string(), title: title.to_string() }
    }

    #[test]
    fn tickers_are_normalized() {
        assert_eq!(normalize_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("brk-b").unwrap(), "BRK-B");
        assert!(matches!(normalize_ticker(""), Err(EdgarError::UnknownTicker(_))));
        assert!(matches!(normalize_ticker("AA PL"), Err(EdgarError::UnknownTicker(_))));
        assert!(matches!(normalize_ticker("../etc"), Err(EdgarError::UnknownTicker(_))));
    }

    #[test]
    fn issuer_lookup_is_case_insensitive() {
        let mapping = vec![company(320193, "aapl", "Apple Inc."), company(789019, "MSFT", "Microsoft Corp")];
        assert_eq!(find_issuer(&mapping, "AAPL").unwrap().cik_str, 320193);
        assert_eq!(find_issuer(&mapping, "MSFT").unwrap().cik_str, 789019);
    }

    #[test]
    fn unknown_and_ambiguous_tickers_fail() {
        let mapping = vec![
            company(320193, "AAPL", "Apple Inc."),
            company(1, "DUP", "First"),
            company(2, "DUP", "Second"),
            company(3, "SAME", "Listed twice"),
            company(3, "SAME", "Listed twice"),
        ];
        assert!(matches!(find_issuer(&mapping, "INVALID"), Err(EdgarError::UnknownTicker(_))));
        assert!(matches!(find_issuer(&mapping, "DUP"), Err(EdgarError::UnknownTicker(_))));
        assert_eq!(find_issuer(&mapping, "SAME").unwrap().cik_str, 3);
    }

    #[test]
    fn bad_header_names_are_rejected() {
        let mut config = AppConfig::default();
        config.headers.insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(EdgarClient::new(&config), Err(EdgarError::InvalidHeader(_))));
    }

    #[test]
    fn fetch_failures_are_classified() {
        let http = EdgarError::Http { status: reqwest::StatusCode::NOT_FOUND, url: "u".to_string() };
        assert!(http.is_fetch_failure());
        assert!(!EdgarError::UnknownTicker("X".to_string()).is_fetch_failure());
    }
}
