//! Minimal client for the Tavily search API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{SourceError, SourceResult};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

/// Search client holding an injected API key.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: Option<String>,
}

impl TavilyClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
    ) -> SourceResult<Vec<SearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey("TAVILY_API_KEY"))?;

        debug!("Tavily search query: {}", query);
        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&SearchRequest {
                api_key,
                query,
                max_results,
                search_depth: depth.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::from_response("Tavily", response).await);
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserialization() {
        let sample = r#"{
            "query": "Apple annual report",
            "results": [
                {"title": "Apple 10-K 2023", "url": "https://apple.com/10k.pdf", "content": "FY23", "score": 0.82},
                {"url": "https://apple.com/ir"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(sample).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].score, Some(0.82));
        assert!(parsed.results[1].title.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let client = TavilyClient::new(Client::new(), None);
        assert!(!client.is_configured());
        let err = client.search("anything", 5, SearchDepth::Basic).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingApiKey("TAVILY_API_KEY")));
    }
}
