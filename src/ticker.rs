//! Ticker symbol -> company name resolution

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};

const YAHOO_SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

#[async_trait]
pub trait TickerResolver: Send + Sync {
    /// Company name for a ticker, `None` when nothing matches.
    async fn resolve(&self, ticker: &str) -> SourceResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

impl YahooQuote {
    fn company_name(&self) -> Option<String> {
        [&self.shortname, &self.longname, &self.name, &self.display_name]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .cloned()
    }
}

/// Prefer the first named exact symbol match (ignoring an exchange suffix),
/// else the first quote.
fn pick_name(quotes: &[YahooQuote], symbol: &str) -> Option<String> {
    quotes
        .iter()
        .filter(|q| {
            let q_symbol = q.symbol.as_deref().unwrap_or_default().to_uppercase();
            let base = q_symbol.split('.').next().unwrap_or_default();
            q_symbol == symbol || base == symbol
        })
        .find_map(YahooQuote::company_name)
        .or_else(|| quotes.first().and_then(YahooQuote::company_name))
}

/// Resolves tickers through Yahoo Finance's public symbol search.
pub struct YahooTickerResolver {
    client: Client,
}

impl YahooTickerResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TickerResolver for YahooTickerResolver {
    async fn resolve(&self, ticker: &str) -> SourceResult<Option<String>> {
        let symbol = ticker.trim().to_uppercase();
        if symbol.is_empty() {
            return Ok(None);
        }

        debug!("Resolving ticker {} via Yahoo Finance", symbol);
        let response = self
            .client
            .get(YAHOO_SEARCH_URL)
            .query(&[
                ("q", symbol.as_str()),
                ("quotesCount", "10"),
                ("newsCount", "0"),
                ("lang", "en-US"),
                ("region", "US"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::from_response("Yahoo Finance", response).await);
        }

        let body: YahooSearchResponse = response.json().await?;
        Ok(pick_name(&body.quotes, &symbol))
    }
}
