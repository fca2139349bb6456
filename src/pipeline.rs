//! End-to-end request handling: parse, search, filter, select, download, record

use chrono::Datelike;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::aggregator::SearchAggregator;
use crate::downloader::{download_one, Fetcher};
use crate::matcher::filter_by_company;
use crate::models::{DownloadRecord, FetchRequest, FetchResponse, Intent};
use crate::parser::parse_prompt;
use crate::selector::select_best_matches;
use crate::storage::MetadataSink;
use crate::ticker::TickerResolver;
use crate::validator::is_valid;

/// Upper bound on the number of years a window may span.
pub const MAX_YEAR_WINDOW: u32 = 50;

/// The last `window` completed calendar years, most recent first. The window
/// is capped at [`MAX_YEAR_WINDOW`].
pub fn years_from_window(window: u32, current_year: i32) -> Vec<i32> {
    let last_complete = current_year - 1;
    let window = window.min(MAX_YEAR_WINDOW) as i32;
    (0..window).map(|i| last_complete - i).collect()
}

pub struct Pipeline {
    aggregator: SearchAggregator,
    ticker_resolver: Arc<dyn TickerResolver>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn MetadataSink>,
    download_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        aggregator: SearchAggregator,
        ticker_resolver: Arc<dyn TickerResolver>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn MetadataSink>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            aggregator,
            ticker_resolver,
            fetcher,
            sink,
            download_dir: download_dir.into(),
        }
    }

    /// Handle one request. Never fails: the worst outcome is an empty result
    /// list next to the parsed intent.
    pub async fn run(&self, request: &FetchRequest) -> FetchResponse {
        let base_intent = parse_prompt(&request.prompt);
        info!("Processing request: {} -> {:?}", request.prompt, base_intent);

        let prepared = self.prepare_intent(&base_intent, request).await;

        let mut results = Vec::new();
        for doc_type in &base_intent.doc_types {
            let intent = prepared.for_doc_type(*doc_type);
            results.extend(self.run_single(intent).await);
        }

        FetchResponse {
            intent: base_intent,
            results,
        }
    }

    /// Apply ticker resolution and the year window once per request.
    async fn prepare_intent(&self, base: &Intent, request: &FetchRequest) -> Intent {
        let mut intent = base.clone();

        if let Some(ticker) = request.ticker.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            intent.extras.ticker = Some(ticker.to_uppercase());
            intent.extras.parsed_company = Some(base.company.clone());
            match self.ticker_resolver.resolve(ticker).await {
                Ok(Some(name)) => {
                    info!("Resolved ticker {} to company {}", ticker, name);
                    intent.company = name;
                }
                Ok(None) => warn!(
                    "Unable to resolve ticker {}, falling back to parsed company {}",
                    ticker, intent.company
                ),
                Err(e) => warn!(
                    "Failed to resolve ticker {} ({}), falling back to parsed company {}",
                    ticker, e, intent.company
                ),
            }
        }

        if let Some(window) = request.year_window.filter(|w| *w > 0) {
            intent.years = years_from_window(window, chrono::Utc::now().year());
            info!("Applying year window ({}): {:?}", window, intent.years);
        }

        intent
    }

    async fn run_single(&self, intent: Intent) -> Vec<DownloadRecord> {
        info!(
            "Searching for {} / {} / years {:?}",
            intent.company, intent.doc_type, intent.years
        );
        let found = self.aggregator.aggregate(&intent).await;
        info!("Found {} files for {}", found.len(), intent.doc_type);

        let parsed_company = intent
            .extras
            .parsed_company
            .clone()
            .unwrap_or_else(|| intent.company.clone());
        let found = filter_by_company(
            found,
            &intent.company,
            &parsed_company,
            intent.extras.ticker.as_deref(),
        );

        let validated: Vec<_> = found
            .into_iter()
            .filter(|c| is_valid(c, intent.doc_type, &intent.extras, &intent.years))
            .collect();
        let selected = select_best_matches(&validated, &intent.years);
        info!("Filtered to {} files for {}", selected.len(), intent.doc_type);

        let default_year = intent.years.first().copied();
        let mut results = Vec::new();
        for candidate in &selected {
            let year = candidate.year.or(default_year);
            let record = match download_one(
                self.fetcher.as_ref(),
                &self.download_dir,
                &intent.company,
                intent.doc_type,
                year,
                candidate,
            )
            .await
            {
                Ok(record) => record,
                Err(e) => {
                    error!("Failed to download {}: {:#}", candidate.url, e);
                    continue;
                }
            };

            match self.sink.record(&record).await {
                Ok(true) => {}
                Ok(false) => info!("Already recorded {} (sha256 {})", record.url, record.sha256),
                Err(e) => error!("Failed to record metadata for {}: {:#}", record.url, e),
            }
            results.push(record);
        }

        info!(
            "Successfully downloaded {} files for {}",
            results.len(),
            intent.doc_type
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{SourceError, SourceResult};
    use crate::models::{Candidate, DocType, Source};
    use crate::sources::SourceAdapter;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedAdapter {
        source: Source,
        hits: Vec<Candidate>,
        seen: Mutex<Vec<Intent>>,
    }

    impl FixedAdapter {
        fn new(source: Source, hits: Vec<Candidate>) -> Arc<Self> {
            Arc::new(Self { source, hits, seen: Mutex::new(vec![]) })
        }
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        fn source(&self) -> Source {
            self.source
        }

        async fn search(&self, intent: &Intent) -> SourceResult<Vec<Candidate>> {
            self.seen.lock().unwrap().push(intent.clone());
            Ok(self
                .hits
                .iter()
                .filter(|c| c.title.to_lowercase().contains(&intent.doc_type.as_str().to_lowercase())
                    || intent.doc_type == DocType::AnnualReport)
                .cloned()
                .collect())
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        fn source(&self) -> Source {
            Source::InvestorRelations
        }

        async fn search(&self, _intent: &Intent) -> SourceResult<Vec<Candidate>> {
            Err(SourceError::CompanyNotFound("nobody".to_string()))
        }
    }

    struct StaticResolver(Option<&'static str>);

    #[async_trait]
    impl TickerResolver for StaticResolver {
        async fn resolve(&self, _ticker: &str) -> SourceResult<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct FakeFetcher;

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
            if url.contains("broken") {
                return Err(anyhow!("HTTP 404"));
            }
            Ok((url.as_bytes().to_vec(), Some("application/pdf".to_string())))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<DownloadRecord>>,
    }

    #[async_trait]
    impl MetadataSink for MemorySink {
        async fn record(&self, record: &DownloadRecord) -> Result<bool> {
            let mut records = self.records.lock().unwrap();
            if records.iter().any(|r| r.sha256 == record.sha256) {
                return Ok(false);
            }
            records.push(record.clone());
            Ok(true)
        }
    }

    fn candidate(title: &str, url: &str, year: Option<i32>, confidence: f64) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: title.to_string(),
            year,
            mimetype: Some("application/pdf".to_string()),
            source: Source::WebSearch,
            confidence,
        }
    }

    fn pipeline(
        web: Arc<FixedAdapter>,
        resolver: Option<&'static str>,
        sink: Arc<MemorySink>,
        dir: &TempDir,
    ) -> Pipeline {
        let aggregator = SearchAggregator::new(
            web,
            FixedAdapter::new(Source::Filings, vec![]),
            Arc::new(FailingAdapter),
        );
        Pipeline::new(
            aggregator,
            Arc::new(StaticResolver(resolver)),
            Arc::new(FakeFetcher),
            sink,
            dir.path(),
        )
    }

    #[test]
    fn test_years_from_window() {
        assert_eq!(years_from_window(3, 2025), vec![2024, 2023, 2022]);
        assert!(years_from_window(0, 2025).is_empty());

        let capped = years_from_window(u32::MAX, 2025);
        assert_eq!(capped.len(), MAX_YEAR_WINDOW as usize);
        assert_eq!(capped[0], 2024);
        assert_eq!(*capped.last().unwrap(), 1975);
    }

    #[tokio::test]
    async fn test_latest_annual_report_with_ticker_returns_one() {
        let dir = TempDir::new().unwrap();
        let web = FixedAdapter::new(
            Source::WebSearch,
            vec![
                candidate("Apple Inc. Annual Report 2023", "https://apple.com/ar-2023.pdf", Some(2023), 0.9),
                candidate("Apple Inc. Annual Report 2022", "https://apple.com/ar-2022.pdf", Some(2022), 0.8),
                candidate("Other Corp annual report", "https://other.com/ar.pdf", None, 0.95),
            ],
        );
        let sink = Arc::new(MemorySink::default());
        let pipeline = pipeline(web.clone(), Some("Apple Inc."), sink.clone(), &dir);

        let response = pipeline
            .run(&FetchRequest {
                prompt: "Download the latest annual report of Apple".to_string(),
                ticker: Some("aapl".to_string()),
                year_window: None,
            })
            .await;

        assert_eq!(response.intent.company, "Apple");
        assert_eq!(response.intent.doc_type, DocType::AnnualReport);
        assert!(response.intent.years.is_empty());
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].url, "https://apple.com/ar-2023.pdf");
        assert_eq!(response.results[0].company, "Apple Inc.");
        assert_eq!(sink.records.lock().unwrap().len(), 1);

        let seen = web.seen.lock().unwrap();
        assert_eq!(seen[0].company, "Apple Inc.");
        assert_eq!(seen[0].extras.ticker.as_deref(), Some("AAPL"));
        assert_eq!(seen[0].extras.parsed_company.as_deref(), Some("Apple"));
    }

    #[tokio::test]
    async fn test_one_record_per_requested_year() {
        let dir = TempDir::new().unwrap();
        let web = FixedAdapter::new(
            Source::WebSearch,
            vec![
                candidate("Infosys annual report 2021", "https://infosys.com/a.pdf", Some(2021), 0.9),
                candidate("Infosys annual report 2021 (copy)", "https://infosys.com/b.pdf", Some(2021), 0.8),
                candidate("Infosys annual report 2022", "https://infosys.com/c.pdf", Some(2022), 0.7),
                candidate("Infosys annual report 2019", "https://infosys.com/d.pdf", Some(2019), 0.6),
                candidate("Infosys annual report 2022", "https://infosys.com/broken.pdf", Some(2022), 0.95),
            ],
        );
        let sink = Arc::new(MemorySink::default());
        let pipeline = pipeline(web, None, sink, &dir);

        let response = pipeline
            .run(&FetchRequest {
                prompt: "Infosys annual report 2021 and 2022".to_string(),
                ..Default::default()
            })
            .await;

        assert_eq!(response.intent.years, vec![2021, 2022]);
        // the 2022 pick fails to download and is skipped, not retried
        let urls: Vec<&str> = response.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://infosys.com/a.pdf"]);
    }

    #[tokio::test]
    async fn test_multiple_doc_types_run_independently() {
        let dir = TempDir::new().unwrap();
        let web = FixedAdapter::new(
            Source::WebSearch,
            vec![
                candidate("Tesla annual report 2023", "https://tesla.com/ar.pdf", Some(2023), 0.9),
                candidate("Tesla investor presentation 2023", "https://tesla.com/deck.pdf", Some(2023), 0.8),
            ],
        );
        let sink = Arc::new(MemorySink::default());
        let pipeline = pipeline(web.clone(), None, sink, &dir);

        let response = pipeline
            .run(&FetchRequest {
                prompt: "Tesla annual report and investor presentation 2023".to_string(),
                ..Default::default()
            })
            .await;

        assert_eq!(
            response.intent.doc_types,
            vec![DocType::AnnualReport, DocType::InvestorPresentation]
        );
        let urls: Vec<&str> = response.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://tesla.com/ar.pdf", "https://tesla.com/deck.pdf"]);
        assert_eq!(response.results[1].doc_type, DocType::InvestorPresentation);

        let seen = web.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].doc_type, DocType::InvestorPresentation);
    }

    #[tokio::test]
    async fn test_year_window_overrides_parsed_years() {
        let dir = TempDir::new().unwrap();
        let web = FixedAdapter::new(Source::WebSearch, vec![]);
        let sink = Arc::new(MemorySink::default());
        let pipeline = pipeline(web.clone(), None, sink, &dir);

        let response = pipeline
            .run(&FetchRequest {
                prompt: "Apple annual report 2015".to_string(),
                ticker: None,
                year_window: Some(2),
            })
            .await;

        assert_eq!(response.intent.years, vec![2015]);
        assert!(response.results.is_empty());
        let seen = web.seen.lock().unwrap();
        let current = chrono::Utc::now().year();
        assert_eq!(seen[0].years, vec![current - 1, current - 2]);
    }
}
