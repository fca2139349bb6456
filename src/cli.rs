use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "irfetch")]
#[command(about = "Find and download annual reports, filings and investor documents from a plain-English request")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a request and download the matching documents
    Fetch {
        /// Natural-language request, e.g. "Infosys annual report 2022-23"
        prompt: String,

        /// Company ticker symbol, used to resolve and verify the company
        #[arg(short, long)]
        ticker: Option<String>,

        /// Fetch the last N completed years instead of the years in the prompt (at most 50)
        #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..=50))]
        year_window: Option<u32>,

        /// Output directory (defaults to IRFETCH_DOWNLOAD_DIR)
        #[arg(short, long)]
        output: Option<String>,

        /// Database file path (defaults to IRFETCH_DB_PATH)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Show how a request is interpreted without searching
    Parse {
        /// Natural-language request
        prompt: String,
    },

    /// List recorded downloads, optionally filtered
    List {
        /// Database file path (defaults to IRFETCH_DB_PATH)
        #[arg(short, long)]
        database: Option<String>,

        /// Company name substring
        #[arg(short, long)]
        company: Option<String>,

        /// Document type, e.g. "annual report" or "10-K"
        #[arg(long)]
        doc_type: Option<String>,

        /// Fiscal year
        #[arg(short, long)]
        year: Option<i32>,

        /// Maximum number of records
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}
