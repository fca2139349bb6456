//! Centralized configuration management for irfetch

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite metadata database
    pub database_path: PathBuf,
    /// Directory for downloaded documents
    pub download_dir: PathBuf,
    /// Directory for JSON metadata sidecar files
    pub metadata_dir: PathBuf,
    /// Tavily search API key (optional; web search is skipped without it)
    pub tavily_api_key: Option<String>,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout for search and lookup calls in seconds
    pub timeout_seconds: u64,
    /// Request timeout for document downloads in seconds
    pub download_timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// User agent sent to SEC EDGAR, which requires a contact address
    pub sec_user_agent: String,
}

const DEFAULT_USER_AGENT: &str = "irfetch/0.1.0";
const DEFAULT_SEC_USER_AGENT: &str = "irfetch/0.1.0 (contact@example.com)";

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            download_timeout_seconds: 180,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sec_user_agent: DEFAULT_SEC_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let database_path = std::env::var("IRFETCH_DB_PATH")
            .unwrap_or_else(|_| "./irfetch.db".to_string())
            .into();

        let download_dir = std::env::var("IRFETCH_DOWNLOAD_DIR")
            .unwrap_or_else(|_| "./data/downloads".to_string())
            .into();

        let metadata_dir = std::env::var("IRFETCH_METADATA_DIR")
            .unwrap_or_else(|_| "./data/metadata".to_string())
            .into();

        let tavily_api_key = std::env::var("TAVILY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let http = HttpConfig {
            timeout_seconds: parse_env_var("IRFETCH_HTTP_TIMEOUT_SECONDS")?.unwrap_or(30),
            download_timeout_seconds: parse_env_var("IRFETCH_DOWNLOAD_TIMEOUT_SECONDS")?.unwrap_or(180),
            user_agent: std::env::var("IRFETCH_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            sec_user_agent: std::env::var("IRFETCH_SEC_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_SEC_USER_AGENT.to_string()),
        };

        Ok(Config {
            database_path,
            download_dir,
            metadata_dir,
            tavily_api_key,
            http,
        })
    }

    /// Get database path as string
    pub fn database_path_str(&self) -> &str {
        self.database_path.to_str().unwrap_or("./irfetch.db")
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get download timeout as Duration
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.http.download_timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Database parent directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        std::fs::create_dir_all(&self.download_dir)
            .with_context(|| format!("Cannot create download directory: {}", self.download_dir.display()))?;
        std::fs::create_dir_all(&self.metadata_dir)
            .with_context(|| format!("Cannot create metadata directory: {}", self.metadata_dir.display()))?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
