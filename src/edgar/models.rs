// src/edgar/models.rs
use crate::utils::error::EdgarError;
use chrono::NaiveDate;
use serde::Deserialize;

/// Form type of the annual report.
pub const ANNUAL_FORM: &str = "10-K";

/// One entry of the ticker mapping
/// Example: https://www.sec.gov/files/company_tickers.json
/// `{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTicker {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

/// Structure representing the EDGAR company submission index, reduced to what the locator reads
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
}

/// Column-oriented list of recent filings; index `i` of every vector describes the same filing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsList {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
    pub primary_document: Vec<String>,
}

impl FilingsList {
    /// Picks the 10-K with the latest filing date; equal dates go to the highest accession number.
    /// Entries whose date cannot be parsed are skipped.
    pub fn latest_annual(&self) -> Result<Option<AnnualEntry<'_>>, EdgarError> {
        let len = self.accession_number.len();
        if self.filing_date.len() != len || self.form.len() != len || self.primary_document.len() != len {
            return Err(EdgarError::Parse(format!(
                "Filing index columns differ in length (accessionNumber {}, filingDate {}, form {}, primaryDocument {})",
                len,
                self.filing_date.len(),
                self.form.len(),
                self.primary_document.len()
            )));
        }

        let mut latest: Option<AnnualEntry<'_>> = None;
        for i in 0..len {
            if self.form[i] != ANNUAL_FORM {
                continue;
            }
            let filing_date = match NaiveDate::parse_from_str(&self.filing_date[i], "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    tracing::warn!(
                        "Skipping {} with unparsable filing date {:?}",
                        self.accession_number[i],
                        self.filing_date[i]
                    );
                    continue;
                }
            };
            let candidate = AnnualEntry {
                filing_date,
                accession_number: &self.accession_number[i],
                primary_document: &self.primary_document[i],
            };
            let newer = match &latest {
                None => true,
                Some(best) => {
                    (candidate.filing_date, candidate.accession_number)
                        > (best.filing_date, best.accession_number)
                }
            };
            if newer {
                latest = Some(candidate);
            }
        }
        Ok(latest)
    }
}

/// Borrowed view of one 10-K row in the filing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnualEntry<'a> {
    pub filing_date: NaiveDate,
    pub accession_number: &'a str,
    pub primary_document: &'a str,
}

/// A resolved annual filing, ready to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReference {
    pub ticker: String,
    pub cik: u64,
    pub company_name: String,
    pub form_type: String,
    pub filing_date: NaiveDate,
    pub accession_number: String,
    pub primary_document: String,
}

impl FilingReference {
    /// Constructs the URL of the primary document of this filing under `archives_base`
    pub fn primary_doc_url(&self, archives_base: &str) -> String {
        let acc_no_dashes = self.accession_number.replace('-', "");
        format!(
            "{}/{}/{}/{}",
            archives_base.trim_end_matches('/'),
            self.cik,
            acc_no_dashes,
            self.primary_document
        )
    }
}

/// Filing markup as downloaded.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub html: String,
}
