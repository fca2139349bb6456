//! Investor-relations page scraper
//!
//! Guesses IR page URLs from the company name (optionally adding pages found
//! through web search), fetches each page and keeps links that look like
//! documents.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info};
use url::Url;

use super::tavily::{SearchDepth, TavilyClient};
use super::{looks_like_pdf, SourceAdapter};
use crate::errors::{SourceError, SourceResult};
use crate::models::{Candidate, Intent, Source};
use crate::text::guess_year;

const LINK_KEYWORDS: [&str; 8] = [
    "annual report",
    "10-k",
    "20-f",
    "investor presentation",
    "results",
    "financials",
    "quarterly",
    "earnings",
];
const IR_URL_HINTS: [&str; 3] = ["investor", "ir.", "investor-relations"];
const MAX_DISCOVERED_PAGES: usize = 5;
const MAX_RESULTS: usize = 30;

/// Heuristic IR page URLs for a company name.
pub fn candidate_ir_urls(company: &str) -> Vec<String> {
    let base = company.replace(' ', "").to_lowercase();
    vec![
        format!("https://{}.com/investors", base),
        format!("https://{}.com/investor-relations", base),
        format!("https://investor.{}.com", base),
        format!("https://ir.{}.com", base),
        format!("https://{}.in/investors", base),
        format!("https://www.{}.com/investors", base),
    ]
}

/// Pull document-looking links out of an IR page.
pub fn extract_document_links(html: &str, page_url: &str, intent: &Intent) -> SourceResult<Vec<Candidate>> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Ok(vec![]),
    };

    let mut found = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let raw_text = anchor.text().collect::<String>();
        let text = raw_text.trim();
        let text_lower = text.to_lowercase();
        let href_lower = href.to_lowercase();

        let is_pdf = looks_like_pdf(href);
        let matches_keyword = LINK_KEYWORDS
            .iter()
            .any(|k| text_lower.contains(k) || href_lower.contains(k));
        if !is_pdf && !matches_keyword {
            continue;
        }

        let resolved = if href_lower.starts_with("http") {
            href.to_string()
        } else if href.starts_with('/') || !href.contains(':') {
            match base.join(href) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            }
        } else {
            // mailto:, javascript: and similar
            continue;
        };

        let year = guess_year(&text_lower)
            .or_else(|| guess_year(&resolved))
            .or_else(|| intent.years.first().copied());

        found.push(Candidate {
            title: if text.is_empty() { resolved.clone() } else { text.to_string() },
            url: resolved,
            year,
            mimetype: is_pdf.then(|| "application/pdf".to_string()),
            source: Source::InvestorRelations,
            confidence: if is_pdf { 0.7 } else { 0.6 },
        });
    }
    Ok(found)
}

pub struct InvestorRelationsAdapter {
    client: Client,
    tavily: TavilyClient,
}

impl InvestorRelationsAdapter {
    pub fn new(client: Client, tavily: TavilyClient) -> Self {
        Self { client, tavily }
    }

    /// IR pages found through web search; empty when search is not configured.
    async fn discover_ir_pages(&self, company: &str) -> Vec<String> {
        if !self.tavily.is_configured() {
            return vec![];
        }
        let query = format!("\"{}\" investor relations site", company);
        match self.tavily.search(&query, 5, SearchDepth::Basic).await {
            Ok(results) => results
                .into_iter()
                .map(|r| r.url)
                .filter(|u| {
                    let lower = u.to_lowercase();
                    IR_URL_HINTS.iter().any(|h| lower.contains(h))
                })
                .take(MAX_DISCOVERED_PAGES)
                .collect(),
            Err(e) => {
                error!("Error finding IR pages with web search: {}", e);
                vec![]
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> SourceResult<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::from_response("IR page", response).await);
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SourceAdapter for InvestorRelationsAdapter {
    fn source(&self) -> Source {
        Source::InvestorRelations
    }

    async fn search(&self, intent: &Intent) -> SourceResult<Vec<Candidate>> {
        let mut pages = self.discover_ir_pages(&intent.company).await;
        for url in candidate_ir_urls(&intent.company) {
            if !pages.contains(&url) {
                pages.push(url);
            }
        }
        info!("Checking {} IR URLs for {}", pages.len(), intent.company);

        let mut found = Vec::new();
        for page in &pages {
            let html = match self.fetch_page(page).await {
                Ok(html) => html,
                Err(e) => {
                    debug!("Error scraping {}: {}", page, e);
                    continue;
                }
            };
            match extract_document_links(&html, page, intent) {
                Ok(mut links) => found.append(&mut links),
                Err(e) => debug!("Error parsing links on {}: {}", page, e),
            }
        }

        found.truncate(MAX_RESULTS);
        info!("IR scraper found {} documents", found.len());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocType, Extras};

    fn intent() -> Intent {
        Intent {
            company: "Infosys".to_string(),
            doc_type: DocType::AnnualReport,
            doc_types: vec![DocType::AnnualReport],
            years: vec![],
            extras: Extras::default(),
        }
    }

    #[test]
    fn test_candidate_ir_urls() {
        let urls = candidate_ir_urls("Tata Motors");
        assert_eq!(urls.len(), 6);
        assert_eq!(urls[0], "https://tatamotors.com/investors");
        assert_eq!(urls[3], "https://ir.tatamotors.com");
    }

    #[test]
    fn test_extract_document_links() {
        let html = r#"
            <html><body>
                <a href="/content/dam/ar-2023.pdf">Integrated Annual Report 2022-23</a>
                <a href="https://cdn.infosys.com/q3-results.html">Q3 Results FY24</a>
                <a href="/about">About us</a>
                <a href="mailto:ir@infosys.com">Annual report requests</a>
                <a href="docs/presentation.pdf"></a>
            </body></html>
        "#;
        let links = extract_document_links(html, "https://www.infosys.com/investors/", &intent()).unwrap();
        assert_eq!(links.len(), 3);

        assert_eq!(links[0].url, "https://www.infosys.com/content/dam/ar-2023.pdf");
        assert_eq!(links[0].year, Some(2023));
        assert_eq!(links[0].confidence, 0.7);
        assert_eq!(links[0].mimetype.as_deref(), Some("application/pdf"));

        assert_eq!(links[1].title, "Q3 Results FY24");
        assert_eq!(links[1].year, Some(2024));
        assert_eq!(links[1].confidence, 0.6);
        assert!(links[1].mimetype.is_none());

        assert_eq!(links[2].url, "https://www.infosys.com/investors/docs/presentation.pdf");
        assert_eq!(links[2].title, links[2].url);
    }
}
