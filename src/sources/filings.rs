//! Regulatory filings adapter backed by SEC EDGAR's JSON endpoints

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::SourceAdapter;
use crate::errors::{SourceError, SourceResult};
use crate::models::{Candidate, Intent, Source};
use crate::validator::acceptable_mime;

const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SUBMISSIONS_BASE_URL: &str = "https://data.sec.gov/submissions";
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";
const FILING_CONFIDENCE: f64 = 0.7;
const MAX_FILINGS: usize = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTicker {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    name: String,
    filings: FilingsData,
}

#[derive(Debug, Deserialize)]
struct FilingsData {
    recent: RecentFilings,
}

#[derive(Debug, Default, Deserialize)]
struct RecentFilings {
    #[serde(rename = "accessionNumber", default)]
    accession_number: Vec<String>,
    #[serde(rename = "filingDate", default)]
    filing_date: Vec<String>,
    #[serde(rename = "reportDate", default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(rename = "primaryDocument", default)]
    primary_document: Vec<String>,
    #[serde(rename = "primaryDocDescription", default)]
    primary_doc_description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct FilingEntry {
    accession_number: String,
    filing_date: String,
    report_date: String,
    form: String,
    primary_document: String,
    primary_doc_description: String,
}

impl RecentFilings {
    /// Zip EDGAR's parallel arrays into one entry per filing.
    fn entries(&self) -> Vec<FilingEntry> {
        let at = |v: &Vec<String>, i: usize| v.get(i).cloned().unwrap_or_default();
        (0..self.accession_number.len())
            .map(|i| FilingEntry {
                accession_number: self.accession_number[i].clone(),
                filing_date: at(&self.filing_date, i),
                report_date: at(&self.report_date, i),
                form: at(&self.form, i),
                primary_document: at(&self.primary_document, i),
                primary_doc_description: at(&self.primary_doc_description, i),
            })
            .collect()
    }
}

fn is_annual_form(form: &str) -> bool {
    form.starts_with("10-K") || form.starts_with("20-F")
}

fn year_of(date: &str) -> Option<i32> {
    date.get(0..4).and_then(|y| y.parse().ok())
}

/// Pick the EDGAR company for a ticker (exact match) or, failing that, a name.
pub fn find_company<'a>(
    tickers: &'a [CompanyTicker],
    ticker: Option<&str>,
    company: &str,
) -> Option<&'a CompanyTicker> {
    if let Some(ticker) = ticker {
        let wanted = ticker.to_uppercase();
        if let Some(hit) = tickers.iter().find(|c| c.ticker.to_uppercase() == wanted) {
            return Some(hit);
        }
    }

    let name = company.to_lowercase();
    if name.is_empty() {
        return None;
    }
    tickers
        .iter()
        .find(|c| c.title.to_lowercase() == name)
        .or_else(|| tickers.iter().find(|c| c.title.to_lowercase().contains(&name)))
}

/// Candidate for a filing whose primary document is a downloadable file.
/// Inline HTML filings yield `None` so they never crowd out other sources.
fn filing_candidate(cik: u64, company_name: &str, filing: &FilingEntry) -> Option<Candidate> {
    let accession_clean = filing.accession_number.replace('-', "");
    let url = format!(
        "{}/{}/{}/{}",
        ARCHIVES_BASE_URL, cik, accession_clean, filing.primary_document
    );
    if !acceptable_mime(None, &url) {
        debug!("Skipping non-document filing {}", url);
        return None;
    }
    let period = if filing.report_date.is_empty() {
        &filing.filing_date
    } else {
        &filing.report_date
    };
    let title = format!(
        "{} {} {} {}",
        company_name, filing.form, filing.primary_doc_description, period
    )
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ");

    Some(Candidate {
        url,
        title,
        year: year_of(period),
        mimetype: None,
        source: Source::Filings,
        confidence: FILING_CONFIDENCE,
    })
}

pub struct FilingsAdapter {
    client: Client,
}

impl FilingsAdapter {
    /// `client` should carry a SEC-compliant user agent with a contact address.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn company_tickers(&self) -> SourceResult<Vec<CompanyTicker>> {
        debug!("Fetching company tickers from: {}", COMPANY_TICKERS_URL);
        let response = self
            .client
            .get(COMPANY_TICKERS_URL)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::from_response("EDGAR", response).await);
        }

        let tickers: HashMap<String, CompanyTicker> = response.json().await?;
        let mut tickers: Vec<CompanyTicker> = tickers.into_values().collect();
        tickers.sort_by_key(|c| c.cik_str);
        Ok(tickers)
    }

    async fn submissions(&self, cik: u64) -> SourceResult<CompanySubmissions> {
        let url = format!("{}/CIK{:0>10}.json", SUBMISSIONS_BASE_URL, cik);
        debug!("Fetching company submissions from: {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::from_response("EDGAR", response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SourceAdapter for FilingsAdapter {
    fn source(&self) -> Source {
        Source::Filings
    }

    async fn search(&self, intent: &Intent) -> SourceResult<Vec<Candidate>> {
        let tickers = self.company_tickers().await?;
        let company = find_company(&tickers, intent.extras.ticker.as_deref(), &intent.company)
            .ok_or_else(|| SourceError::CompanyNotFound(intent.company.clone()))?;
        info!("Found CIK {} for {}", company.cik_str, company.title);

        let submissions = self.submissions(company.cik_str).await?;
        let hits: Vec<Candidate> = submissions
            .filings
            .recent
            .entries()
            .iter()
            .filter(|f| is_annual_form(&f.form) && !f.primary_document.is_empty())
            .filter_map(|f| filing_candidate(company.cik_str, &submissions.name, f))
            .take(MAX_FILINGS)
            .collect();

        info!("EDGAR found {} annual filing documents for {}", hits.len(), submissions.name);
        Ok(hits)
    }
}
