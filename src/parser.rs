//! Rule-based prompt parser: free text -> structured [`Intent`]

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{DocType, Extras, FiscalPeriod, Intent};
use crate::text::complete_range_end;

/// Buckets requested by "all reports" style prompts, in order.
pub const ALL_DOC_TYPES: [DocType; 4] = [
    DocType::AnnualReport,
    DocType::EarningsRelease,
    DocType::InvestorPresentation,
    DocType::FinancialStatements,
];

pub const DEFAULT_DOC_TYPE: DocType = DocType::AnnualReport;

const ALL_PHRASES: [&str; 5] = ["all report", "all reports", "all filings", "all documents", "all docs"];

/// Keyword -> canonical type, evaluated top to bottom, accumulating matches.
const DOC_TYPE_KEYWORDS: &[(&str, DocType)] = &[
    ("annual report", DocType::AnnualReport),
    ("annual", DocType::AnnualReport),
    ("form 10-k", DocType::TenK),
    ("10-k", DocType::TenK),
    ("10k", DocType::TenK),
    ("10-q", DocType::TenQ),
    ("10q", DocType::TenQ),
    ("20-f", DocType::TwentyF),
    ("financial statement", DocType::FinancialStatements),
    ("full financial", DocType::FinancialStatements),
    ("balance sheet", DocType::FinancialStatements),
    ("income statement", DocType::FinancialStatements),
    ("cash flow", DocType::FinancialStatements),
    ("investor presentation", DocType::InvestorPresentation),
    ("investor deck", DocType::InvestorPresentation),
    ("slide deck", DocType::InvestorPresentation),
    ("investor slide deck", DocType::InvestorPresentation),
    ("presentation deck", DocType::InvestorPresentation),
    ("earnings presentation", DocType::InvestorPresentation),
    ("earnings release", DocType::EarningsRelease),
    ("quarterly report", DocType::EarningsRelease),
    ("quarterly results", DocType::EarningsRelease),
    ("half-year", DocType::EarningsRelease),
    ("semi-annual", DocType::EarningsRelease),
    ("quarterly", DocType::EarningsRelease),
    ("results release", DocType::EarningsRelease),
];

const QUARTER_PATTERNS: &[(FiscalPeriod, &[&str])] = &[
    (FiscalPeriod::Q1, &[r"\bq1\b", r"\bq 1\b", r"first quarter", r"1st quarter", r"quarter one"]),
    (FiscalPeriod::Q2, &[r"\bq2\b", r"\bq 2\b", r"second quarter", r"2nd quarter", r"quarter two"]),
    (FiscalPeriod::Q3, &[r"\bq3\b", r"\bq 3\b", r"third quarter", r"3rd quarter", r"quarter three"]),
    (
        FiscalPeriod::Q4,
        &[r"\bq4\b", r"\bq 4\b", r"fourth quarter", r"4th quarter", r"quarter four", r"year-end quarter"],
    ),
];

const HALF_PATTERNS: &[(FiscalPeriod, &[&str])] = &[
    (
        FiscalPeriod::H1,
        &[r"\bh1\b", r"first half", r"1st half", r"half-year", r"semi-annual", r"semiannual"],
    ),
    (FiscalPeriod::H2, &[r"\bh2\b", r"second half", r"2nd half", r"h2 fy", r"h2fy"]),
];

const STOP_WORDS: &[&str] = &[
    "download", "latest", "report", "reports", "annual", "quarterly", "from", "the", "of", "to",
    "and", "get", "all", "files", "filings", "documents", "docs", "an", "for", "me", "please",
    "fetch", "find", "pdf", "fy", "form", "earnings", "release", "results", "investor",
    "presentation", "financial", "statements", "statement", "first", "second", "third",
    "fourth", "quarter", "half", "half-year", "semi-annual",
];

pub const UNKNOWN_COMPANY: &str = "Unknown";

lazy_static! {
    static ref PROMPT_RANGE_REGEX: Regex = Regex::new(
        r"(?i)(20\d{2})\s*(?:to|-|–|—)\s*(\d{2,4})"
    ).unwrap();

    static ref PROMPT_YEAR_REGEX: Regex = Regex::new(r"20\d{2}").unwrap();

    static ref WORD_REGEX: Regex = Regex::new(r"[A-Za-z][A-Za-z&.\-]*").unwrap();

    static ref QUARTER_REGEXES: Vec<(FiscalPeriod, Vec<Regex>)> = compile_periods(QUARTER_PATTERNS);
    static ref HALF_REGEXES: Vec<(FiscalPeriod, Vec<Regex>)> = compile_periods(HALF_PATTERNS);
}

fn compile_periods(table: &[(FiscalPeriod, &[&str])]) -> Vec<(FiscalPeriod, Vec<Regex>)> {
    table
        .iter()
        .map(|(period, patterns)| {
            let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
            (*period, compiled)
        })
        .collect()
}

/// Parse a free-text request into an [`Intent`]. Never fails; ambiguous
/// input yields a low-quality best guess.
pub fn parse_prompt(prompt: &str) -> Intent {
    let text = prompt.trim();

    let doc_types = extract_doc_types(text);
    let doc_type = doc_types[0];

    Intent {
        company: extract_company(text),
        doc_type,
        doc_types,
        years: extract_years(text),
        extras: Extras {
            period: detect_period(text),
            ..Default::default()
        },
    }
}

pub fn extract_doc_types(text: &str) -> Vec<DocType> {
    let lower = text.to_lowercase();

    if ALL_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return ALL_DOC_TYPES.to_vec();
    }

    let mut doc_types = Vec::new();
    for (needle, doc_type) in DOC_TYPE_KEYWORDS {
        if lower.contains(needle) && !doc_types.contains(doc_type) {
            doc_types.push(*doc_type);
        }
    }

    if doc_types.is_empty() {
        doc_types.push(DEFAULT_DOC_TYPE);
    }
    doc_types
}

/// Explicit years in the prompt, ascending and de-duplicated.
///
/// A fiscal-year range written with a two-digit end ("2022-23") names a
/// single year and resolves to its end year. A range with a full end year
/// ("2020 to 2024") keeps both endpoints.
pub fn extract_years(text: &str) -> Vec<i32> {
    if let Some(caps) = PROMPT_RANGE_REGEX.captures(text) {
        let start: Option<i32> = caps[1].parse().ok();
        if let Some(start) = start {
            let end_raw = &caps[2];
            if let Some(end) = complete_range_end(start, end_raw) {
                let mut years = if end_raw.len() == 2 { vec![end] } else { vec![start, end] };
                years.sort_unstable();
                years.dedup();
                return years;
            }
        }
    }

    let mut years: Vec<i32> = PROMPT_YEAR_REGEX
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// First matching quarter, else first matching half-year.
pub fn detect_period(text: &str) -> Option<FiscalPeriod> {
    let lower = text.to_lowercase();
    QUARTER_REGEXES
        .iter()
        .chain(HALF_REGEXES.iter())
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&lower)))
        .map(|(period, _)| *period)
}

/// First significant word of the prompt. Multi-word names are not reassembled.
pub fn extract_company(text: &str) -> String {
    WORD_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| word.len() > 1)
        .find(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_COMPANY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_annual_report() {
        let intent = parse_prompt("Download the latest annual report of Apple");
        assert_eq!(intent.company, "Apple");
        assert_eq!(intent.doc_type, DocType::AnnualReport);
        assert_eq!(intent.doc_types, vec![DocType::AnnualReport]);
        assert!(intent.years.is_empty());
        assert_eq!(intent.extras, Extras::default());
    }

    #[test]
    fn test_all_reports_yields_every_bucket_in_order() {
        let intent = parse_prompt("get all reports for Infosys 2023");
        assert_eq!(intent.doc_types, ALL_DOC_TYPES.to_vec());
        assert_eq!(intent.doc_type, DocType::AnnualReport);

        let intent = parse_prompt("Tesla all filings");
        assert_eq!(intent.doc_types, ALL_DOC_TYPES.to_vec());
    }

    #[test]
    fn test_doc_types_accumulate_in_table_order() {
        let types = extract_doc_types("Microsoft 10-K and investor presentation and balance sheet");
        assert_eq!(
            types,
            vec![DocType::TenK, DocType::FinancialStatements, DocType::InvestorPresentation]
        );
        assert_eq!(extract_doc_types("annual report and annual results"), vec![DocType::AnnualReport]);
    }

    #[test]
    fn test_default_doc_type() {
        assert_eq!(extract_doc_types("Nvidia stuff"), vec![DocType::AnnualReport]);
    }

    #[test]
    fn test_years_two_digit_range_resolves_to_end() {
        assert_eq!(extract_years("Infosys annual report 2022-23"), vec![2023]);
    }

    #[test]
    fn test_years_full_range_keeps_endpoints() {
        assert_eq!(extract_years("Apple reports 2020 to 2024"), vec![2020, 2024]);
        assert_eq!(extract_years("Apple reports 2022-2023"), vec![2022, 2023]);
    }

    #[test]
    fn test_years_plain_tokens_sorted_and_deduped() {
        assert_eq!(extract_years("Apple 2023 and 2021 and 2023"), vec![2021, 2023]);
        assert!(extract_years("Apple latest annual report").is_empty());
    }

    #[test]
    fn test_period_detection() {
        assert_eq!(detect_period("Q3 2021 earnings for Tesla"), Some(FiscalPeriod::Q3));
        assert_eq!(detect_period("second quarter results"), Some(FiscalPeriod::Q2));
        assert_eq!(detect_period("year-end quarter numbers"), Some(FiscalPeriod::Q4));
        assert_eq!(detect_period("semi-annual report"), Some(FiscalPeriod::H1));
        assert_eq!(detect_period("H2 FY24 update"), Some(FiscalPeriod::H2));
        assert_eq!(detect_period("annual report"), None);
    }

    #[test]
    fn test_quarter_wins_over_half() {
        let intent = parse_prompt("first quarter and first half results for Unilever");
        assert_eq!(intent.extras.period, Some(FiscalPeriod::Q1));
    }

    #[test]
    fn test_company_skips_stop_words_and_form_numbers() {
        assert_eq!(extract_company("Get the 10-K for Microsoft"), "Microsoft");
        assert_eq!(extract_company("download Q3 earnings release Tesla"), "Tesla");
    }

    #[test]
    fn test_company_falls_back_to_unknown() {
        assert_eq!(extract_company("download the latest annual report"), UNKNOWN_COMPANY);
        assert_eq!(extract_company(""), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_company_single_token_limitation() {
        // Known limitation: only the first significant word is captured
        assert_eq!(extract_company("Bank of America annual report 2023"), "Bank");
    }
}
