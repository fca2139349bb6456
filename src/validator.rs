//! Per-candidate acceptance filter: file type, year, document type and fiscal period

use tracing::debug;

use crate::models::{Candidate, DocType, Extras, FiscalPeriod};

const DOCUMENT_EXTENSIONS: [&str; 6] = [".pdf", ".doc", ".docx", ".xls", ".xlsx", ".csv"];
const DOCUMENT_PATH_HINTS: [&str; 6] = ["/pdf/", "/document/", "/report/", "/annual", "/10-k", "/10k"];

/// Type-specific keywords; richer than the prompt parser's table.
pub fn doc_type_keywords(doc_type: DocType) -> &'static [&'static str] {
    match doc_type {
        DocType::AnnualReport => &[
            "annual report",
            "annual-report",
            "annual results",
            "form 10-k",
            "10-k",
            "10k",
            "annual disclosure",
        ],
        DocType::EarningsRelease => &[
            "earnings release",
            "quarterly results",
            "quarterly report",
            "results release",
            "press release",
            "trading update",
            "investor update",
            "q1 results",
            "q2 results",
            "q3 results",
            "q4 results",
            "semi-annual",
            "half-year",
        ],
        DocType::InvestorPresentation => &[
            "investor presentation",
            "investor deck",
            "earnings presentation",
            "slide deck",
            "investor slides",
            "investor day",
        ],
        DocType::FinancialStatements => &[
            "financial statements",
            "financial statement",
            "financial results",
            "balance sheet",
            "income statement",
            "cash flow statement",
            "statement of profit",
        ],
        DocType::TenK => &["form 10-k", "10-k", "10k"],
        DocType::TenQ => &["form 10-q", "10-q", "10q"],
        DocType::TwentyF => &["20-f", "form 20-f"],
    }
}

pub fn period_keywords(period: FiscalPeriod) -> &'static [&'static str] {
    match period {
        FiscalPeriod::Q1 => &["q1", "first quarter", "1st quarter", "quarter 1"],
        FiscalPeriod::Q2 => &["q2", "second quarter", "2nd quarter", "quarter 2"],
        FiscalPeriod::Q3 => &["q3", "third quarter", "3rd quarter", "quarter 3"],
        FiscalPeriod::Q4 => &["q4", "fourth quarter", "4th quarter", "quarter 4"],
        FiscalPeriod::H1 => &["h1", "first half", "1st half", "half-year", "semi-annual"],
        FiscalPeriod::H2 => &["h2", "second half", "2nd half", "half-year"],
    }
}

/// Whether the mime type, or the URL when no mime type is known, looks like a document.
pub fn acceptable_mime(mimetype: Option<&str>, url: &str) -> bool {
    match mimetype.filter(|mt| !mt.is_empty()) {
        Some(mt) => {
            let mt = mt.to_lowercase();
            mt.starts_with("application/pdf")
                || mt.ends_with("msword")
                || mt.contains("officedocument")
                || mt.starts_with("text/csv")
                || mt.starts_with("application/vnd.ms-excel")
                || mt.contains("pdf")
        }
        None => {
            let url = url.to_lowercase();
            DOCUMENT_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
                || DOCUMENT_PATH_HINTS.iter().any(|hint| url.contains(hint))
        }
    }
}

/// Year check: passes when nothing was requested; rejects when a year was
/// requested but none can be inferred.
pub fn matches_year(candidate: &Candidate, wanted_years: &[i32]) -> bool {
    if wanted_years.is_empty() {
        return true;
    }
    candidate
        .inferred_year()
        .map(|year| wanted_years.contains(&year))
        .unwrap_or(false)
}

pub fn matches_doc_type(doc_type: DocType, candidate: &Candidate) -> bool {
    let keywords = doc_type_keywords(doc_type);
    if keywords.is_empty() {
        return true;
    }
    let text = candidate.search_text();
    keywords.iter().any(|k| text.contains(k))
}

pub fn matches_period(extras: &Extras, candidate: &Candidate) -> bool {
    match extras.period {
        None => true,
        Some(period) => {
            let text = candidate.search_text();
            period_keywords(period).iter().any(|k| text.contains(k))
        }
    }
}

pub fn is_valid(candidate: &Candidate, doc_type: DocType, extras: &Extras, wanted_years: &[i32]) -> bool {
    let mime_ok = acceptable_mime(candidate.mimetype.as_deref(), &candidate.url);
    let year_ok = matches_year(candidate, wanted_years);
    let type_ok = matches_doc_type(doc_type, candidate);
    let period_ok = matches_period(extras, candidate);

    let valid = mime_ok && year_ok && type_ok && period_ok;
    if !valid {
        debug!(
            "Filtered out: {} (mime_ok={}, year_ok={}, type_ok={}, period_ok={})",
            candidate.url, mime_ok, year_ok, type_ok, period_ok
        );
    }
    valid
}
