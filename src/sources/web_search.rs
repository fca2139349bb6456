//! General web search adapter backed by Tavily

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{error, info};

use super::tavily::{SearchDepth, SearchResult, TavilyClient};
use super::{looks_like_pdf, SourceAdapter};
use crate::errors::{SourceError, SourceResult};
use crate::models::{Candidate, FiscalPeriod, Intent, Source};
use crate::text::guess_year;

const PDF_CONFIDENCE_BOOST: f64 = 0.2;
const DEFAULT_SCORE: f64 = 0.5;

pub struct WebSearchAdapter {
    tavily: TavilyClient,
}

impl WebSearchAdapter {
    pub fn new(tavily: TavilyClient) -> Self {
        Self { tavily }
    }
}

fn period_terms(period: Option<FiscalPeriod>) -> &'static [&'static str] {
    match period {
        Some(FiscalPeriod::Q1) => &["\"Q1\"", "\"first quarter\""],
        Some(FiscalPeriod::Q2) => &["\"Q2\"", "\"second quarter\""],
        Some(FiscalPeriod::Q3) => &["\"Q3\"", "\"third quarter\""],
        Some(FiscalPeriod::Q4) => &["\"Q4\"", "\"fourth quarter\""],
        Some(FiscalPeriod::H1) => &["\"H1\"", "\"first half\"", "\"semi annual\""],
        Some(FiscalPeriod::H2) => &["\"H2\"", "\"second half\""],
        None => &[],
    }
}

/// Broad qualifier for the generic query.
fn period_hint(period: Option<FiscalPeriod>) -> &'static str {
    match period {
        Some(p) if p.is_quarter() => " quarterly results",
        Some(_) => " half-year results",
        None => "",
    }
}

fn wants_year_window(intent: &Intent) -> bool {
    intent.years.len() > 1
}

/// Query set for an intent: direct PDF, investor relations, company site and
/// a generic query, plus per-year queries when several years are wanted.
pub fn build_queries(intent: &Intent) -> Vec<String> {
    let company = &intent.company;
    let doc_type = intent.doc_type.as_str();

    let terms = period_terms(intent.extras.period);
    let period = if terms.is_empty() {
        String::new()
    } else {
        format!(" {}", terms.join(" "))
    };

    let year = match intent.years.as_slice() {
        [single] => format!(" {}", single),
        _ => String::new(),
    };

    let site = company.to_lowercase().replace(' ', "");
    let mut queries = vec![
        format!("\"{}\" \"{}\"{}{} filetype:pdf", company, doc_type, period, year),
        format!("\"{}\" investor relations \"{}\"{}{} PDF", company, doc_type, period, year),
        format!("site:{}.com \"{}\"{}{} PDF", site, doc_type, period, year),
        format!(
            "{} {}{}{}{} PDF download",
            company,
            doc_type,
            period,
            year,
            period_hint(intent.extras.period)
        ),
    ];

    if wants_year_window(intent) {
        for year in intent.years.iter().take(3) {
            queries.push(format!("\"{}\" \"{}\"{} {} filetype:pdf", company, doc_type, period, year));
            queries.push(format!(
                "\"{}\" investor relations \"{}\"{} {} PDF",
                company, doc_type, period, year
            ));
        }
    }
    queries
}

/// Convert one search hit into a candidate.
pub fn candidate_from_result(result: &SearchResult, intent: &Intent) -> Candidate {
    let is_pdf = looks_like_pdf(&result.url);
    let title = result
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| result.url.clone());

    let year = guess_year(&title)
        .or_else(|| intent.years.first().copied())
        .or_else(|| result.content.as_deref().and_then(guess_year));

    let mut confidence = result.score.unwrap_or(DEFAULT_SCORE);
    if is_pdf {
        confidence += PDF_CONFIDENCE_BOOST;
    }

    Candidate {
        url: result.url.clone(),
        title,
        year,
        mimetype: is_pdf.then(|| "application/pdf".to_string()),
        source: Source::WebSearch,
        confidence: confidence.min(1.0),
    }
}

#[async_trait]
impl SourceAdapter for WebSearchAdapter {
    fn source(&self) -> Source {
        Source::WebSearch
    }

    async fn search(&self, intent: &Intent) -> SourceResult<Vec<Candidate>> {
        if !self.tavily.is_configured() {
            return Err(SourceError::MissingApiKey("TAVILY_API_KEY"));
        }

        let window = wants_year_window(intent);
        let max_results = if window { 20 } else { 10 };
        let max_return = if window { 50 } else { 20 };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for query in build_queries(intent) {
            info!("Web search query: {}", query);
            let results = match self.tavily.search(&query, max_results, SearchDepth::Advanced).await {
                Ok(results) => results,
                Err(e) => {
                    error!("Web search error for query '{}': {}", query, e);
                    continue;
                }
            };

            for result in results {
                if result.url.is_empty() || !seen.insert(result.url.clone()) {
                    continue;
                }
                candidates.push(candidate_from_result(&result, intent));
            }
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates.truncate(max_return);
        info!("Web search found {} documents", candidates.len());
        Ok(candidates)
    }
}
