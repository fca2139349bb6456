//! Error types for source adapters and the ticker resolver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0} not configured. Set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("{service} API error (status {status_code}): {message}")]
    ApiError {
        service: &'static str,
        status_code: u16,
        message: String,
    },

    #[error("No company found for '{0}'")]
    CompanyNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    /// Build an [`SourceError::ApiError`] from a non-success response, consuming its body.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status_code = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        SourceError::ApiError {
            service,
            status_code,
            message: message.chars().take(200).collect(),
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
