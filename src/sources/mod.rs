//! Source adapters: independent lookups that each return raw [`Candidate`]s
//!
//! Every adapter shares the same shape so the aggregator can run them in
//! priority order without knowing where the results come from.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::errors::SourceResult;
use crate::models::{Candidate, Intent, Source};

pub mod filings;
pub mod investor_relations;
pub mod tavily;
pub mod web_search;

pub use filings::FilingsAdapter;
pub use investor_relations::InvestorRelationsAdapter;
pub use tavily::TavilyClient;
pub use web_search::WebSearchAdapter;

/// A lookup that turns an intent into candidate documents.
///
/// Errors are reported to the caller, which treats them as zero results.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    async fn search(&self, intent: &Intent) -> SourceResult<Vec<Candidate>>;
}

/// Build the shared HTTP client used by the adapters.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Whether a URL looks like it points at a PDF.
pub(crate) fn looks_like_pdf(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.ends_with(".pdf") || lower.contains("pdf")
}
