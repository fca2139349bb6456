//! Company identity filter applied to aggregated candidates

use tracing::info;

use crate::models::Candidate;
use crate::text::normalize;

/// Normalized name tokens longer than two characters, de-duplicated in order.
fn company_tokens(names: &[Option<&str>]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for name in names.iter().flatten() {
        for token in name.split_whitespace().map(normalize) {
            if token.len() > 2 && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Whether a candidate's title and URL refer to the requested company.
///
/// With a ticker, the ticker itself or at least two name tokens must appear
/// (a single name token is enough only when it is the sole token and at
/// least five characters long). Without a ticker, any name token suffices
/// and an empty name accepts everything.
pub fn matches_company(
    candidate: &Candidate,
    preferred: Option<&str>,
    original: Option<&str>,
    ticker: Option<&str>,
) -> bool {
    let haystack = normalize(&format!("{} {}", candidate.title, candidate.url));
    let tokens = company_tokens(&[preferred, original]);

    if let Some(ticker) = ticker.map(normalize).filter(|t| !t.is_empty()) {
        if haystack.contains(&ticker) {
            return true;
        }
        if tokens.len() >= 2 {
            let hits = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
            return hits >= 2;
        }
        return match tokens.first() {
            Some(only) => only.len() >= 5 && haystack.contains(only.as_str()),
            None => false,
        };
    }

    if tokens.is_empty() {
        return true;
    }
    tokens
        .iter()
        .any(|t| t.len() >= 3 && haystack.contains(t.as_str()))
}

/// Apply the company filter with the fallback policy: a ticker makes the
/// filtered set final even when empty; otherwise an empty filtered set falls
/// back to the unfiltered candidates.
pub fn filter_by_company(
    candidates: Vec<Candidate>,
    preferred: &str,
    original: &str,
    ticker: Option<&str>,
) -> Vec<Candidate> {
    let filtered: Vec<Candidate> = candidates
        .iter()
        .filter(|c| matches_company(c, Some(preferred), Some(original), ticker))
        .cloned()
        .collect();

    if ticker.is_some() {
        info!("Ticker provided; {} results match company/ticker filter", filtered.len());
        filtered
    } else if !filtered.is_empty() {
        info!("Company filter retained {} results", filtered.len());
        filtered
    } else {
        info!("Company filter removed all results; using unfiltered list");
        candidates
    }
}
