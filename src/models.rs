use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::text::guess_year;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "annual report")]
    AnnualReport,
    #[serde(rename = "10-K")]
    TenK,
    #[serde(rename = "10-Q")]
    TenQ,
    #[serde(rename = "20-F")]
    TwentyF,
    #[serde(rename = "financial statements")]
    FinancialStatements,
    #[serde(rename = "earnings release")]
    EarningsRelease,
    #[serde(rename = "investor presentation")]
    InvestorPresentation,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::AnnualReport => "annual report",
            DocType::TenK => "10-K",
            DocType::TenQ => "10-Q",
            DocType::TwentyF => "20-F",
            DocType::FinancialStatements => "financial statements",
            DocType::EarningsRelease => "earnings release",
            DocType::InvestorPresentation => "investor presentation",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fiscal period qualifier: a quarter or a half-year, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    Q1,
    Q2,
    Q3,
    Q4,
    H1,
    H2,
}

impl FiscalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FiscalPeriod::Q1 => "Q1",
            FiscalPeriod::Q2 => "Q2",
            FiscalPeriod::Q3 => "Q3",
            FiscalPeriod::Q4 => "Q4",
            FiscalPeriod::H1 => "H1",
            FiscalPeriod::H2 => "H2",
        }
    }

    pub fn is_quarter(&self) -> bool {
        matches!(
            self,
            FiscalPeriod::Q1 | FiscalPeriod::Q2 | FiscalPeriod::Q3 | FiscalPeriod::Q4
        )
    }
}

/// Optional qualifiers attached to an intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<FiscalPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_company: Option<String>,
}

/// Structured interpretation of a natural-language document request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub company: String,
    pub doc_type: DocType,
    pub doc_types: Vec<DocType>,
    pub years: Vec<i32>,
    pub extras: Extras,
}

impl Intent {
    /// Independent copy of this intent narrowed to a single document type.
    pub fn for_doc_type(&self, doc_type: DocType) -> Intent {
        Intent {
            doc_type,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "Web")]
    WebSearch,
    #[serde(rename = "SEC")]
    Filings,
    #[serde(rename = "IR")]
    InvestorRelations,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::WebSearch => "Web",
            Source::Filings => "SEC",
            Source::InvestorRelations => "IR",
        }
    }
}

/// A single raw search hit produced by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub year: Option<i32>,
    pub mimetype: Option<String>,
    pub source: Source,
    pub confidence: f64,
}

impl Candidate {
    /// Year from the explicit field, else guessed from the title, else from the URL.
    pub fn inferred_year(&self) -> Option<i32> {
        self.year
            .or_else(|| guess_year(&self.title))
            .or_else(|| guess_year(&self.url))
    }

    /// Title and URL joined, lower-cased, for keyword matching.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.url).to_lowercase()
    }
}

/// Metadata describing one successfully downloaded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub company: String,
    pub doc_type: DocType,
    pub year: Option<i32>,
    pub file_path: PathBuf,
    pub filename: String,
    pub url: String,
    pub sha256: String,
    pub mimetype: String,
    pub source: Source,
}

#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub prompt: String,
    pub ticker: Option<String>,
    pub year_window: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub intent: Intent,
    pub results: Vec<DownloadRecord>,
}
