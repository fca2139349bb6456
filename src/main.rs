use clap::Parser;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{info, error};

mod cli;

use cli::{Cli, Commands};
use irfetch::aggregator::SearchAggregator;
use irfetch::config::Config;
use irfetch::downloader::HttpFetcher;
use irfetch::models::FetchRequest;
use irfetch::parser::parse_prompt;
use irfetch::pipeline::Pipeline;
use irfetch::sources::{
    build_client, FilingsAdapter, InvestorRelationsAdapter, TavilyClient, WebSearchAdapter,
};
use irfetch::storage::{self, RecordQuery, Storage};
use irfetch::ticker::YahooTickerResolver;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "irfetch=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = tracing_appender::rolling::never(".", "irfetch.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match &cli.command {
        Commands::Fetch {
            prompt,
            ticker,
            year_window,
            output,
            database,
        } => {
            if let Some(output) = output {
                config.download_dir = output.into();
            }
            if let Some(database) = database {
                config.database_path = database.into();
            }
            config.validate()?;

            info!("Starting fetch for request: {}", prompt);
            let pipeline = build_pipeline(&config).await?;
            let request = FetchRequest {
                prompt: prompt.clone(),
                ticker: ticker.clone(),
                year_window: *year_window,
            };

            let response = pipeline.run(&request).await;
            println!("{}", serde_json::to_string_pretty(&response.intent)?);
            println!("Downloaded {} documents:", response.results.len());
            for record in &response.results {
                println!(
                    "{} - {} ({}) - {} - {}",
                    record.company,
                    record.doc_type,
                    record.year.map(|y| y.to_string()).unwrap_or_else(|| "unknown".to_string()),
                    record.source.as_str(),
                    record.file_path.display()
                );
            }
        }

        Commands::Parse { prompt } => {
            let intent = parse_prompt(prompt);
            println!("{}", serde_json::to_string_pretty(&intent)?);
        }

        Commands::List { database, company, doc_type, year, limit } => {
            let database = database.clone().unwrap_or_else(|| config.database_path_str().to_string());
            let doc_type = doc_type
                .as_deref()
                .map(|d| {
                    storage::parse_doc_type(&d.to_lowercase())
                        .or_else(|| storage::parse_doc_type(&d.to_uppercase()))
                        .ok_or_else(|| anyhow!("Unknown document type: {}", d))
                })
                .transpose()?;
            let query = RecordQuery {
                company: company.clone(),
                doc_type,
                year: *year,
            };
            match storage::search_records(&database, &query, *limit).await {
                Ok(records) => {
                    println!("Found {} records:", records.len());
                    for stored in records {
                        let record = &stored.record;
                        println!(
                            "{} - {} ({}) - {} - {}",
                            record.company,
                            record.doc_type,
                            record.year.map(|y| y.to_string()).unwrap_or_else(|| "unknown".to_string()),
                            record.source.as_str(),
                            record.url
                        );
                    }
                }
                Err(e) => error!("Listing failed: {:#}", e),
            }
        }
    }

    Ok(())
}

/// Wire the adapters, resolver, downloader and metadata store from configuration.
async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let client = build_client(&config.http.user_agent, config.http_timeout())
        .context("Failed to build HTTP client")?;
    let sec_client = build_client(&config.http.sec_user_agent, config.http_timeout())
        .context("Failed to build SEC HTTP client")?;
    let download_client = build_client(&config.http.user_agent, config.download_timeout())
        .context("Failed to build download HTTP client")?;

    if config.tavily_api_key.is_none() {
        info!("TAVILY_API_KEY not set; web search is disabled");
    }
    let tavily = TavilyClient::new(client.clone(), config.tavily_api_key.clone());

    let aggregator = SearchAggregator::new(
        Arc::new(WebSearchAdapter::new(tavily.clone())),
        Arc::new(FilingsAdapter::new(sec_client)),
        Arc::new(InvestorRelationsAdapter::new(client.clone(), tavily)),
    );

    let storage = Storage::new(config.database_path_str())
        .await?
        .with_metadata_dir(&config.metadata_dir);

    Ok(Pipeline::new(
        aggregator,
        Arc::new(YahooTickerResolver::new(client)),
        Arc::new(HttpFetcher::new(download_client)),
        Arc::new(storage),
        config.download_dir.clone(),
    ))
}
