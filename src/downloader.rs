//! Document download: fetch bytes, hash them and write them under a stable path

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::models::{Candidate, DocType, DownloadRecord};
use crate::text::safe_name;

/// Retrieves the raw bytes behind a URL along with the reported mime type.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Failed to download {}: HTTP {}", url, status));
        }

        let mimetype = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), mimetype))
    }
}

/// File extension (with leading dot) for a mime type; ".bin" when unknown.
pub fn extension_for_mime(mimetype: Option<&str>) -> String {
    let essence = mimetype
        .and_then(|mt| mt.split(';').next())
        .map(|mt| mt.trim().to_lowercase())
        .unwrap_or_default();
    if essence.is_empty() {
        return ".bin".to_string();
    }
    if essence == "application/pdf" {
        return ".pdf".to_string();
    }
    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".bin".to_string())
}

/// Destination directory and file name for a document:
/// `{root}/{company}/{doc_type}/{year|unknown}/{company_doc_type_year}{ext}`.
pub fn build_path(root: &Path, company: &str, doc_type: DocType, year: Option<i32>, ext: &str) -> (PathBuf, String) {
    let year_str = year.map(|y| y.to_string()).unwrap_or_default();
    let dir = root
        .join(safe_name(&[company]))
        .join(safe_name(&[doc_type.as_str()]))
        .join(if year_str.is_empty() { "unknown" } else { year_str.as_str() });
    let filename = format!("{}{}", safe_name(&[company, doc_type.as_str(), year_str.as_str()]), ext);
    (dir, filename)
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Download one candidate and write it to disk.
pub async fn download_one(
    fetcher: &dyn Fetcher,
    root: &Path,
    company: &str,
    doc_type: DocType,
    year: Option<i32>,
    candidate: &Candidate,
) -> Result<DownloadRecord> {
    info!(
        "Downloading {} for {} {} {}",
        candidate.url,
        company,
        doc_type,
        year.map(|y| y.to_string()).unwrap_or_default()
    );
    let (data, mimetype) = fetcher.fetch(&candidate.url).await?;

    let sha256 = sha256_hex(&data);
    let ext = extension_for_mime(mimetype.as_deref());
    let (dir, filename) = build_path(root, company, doc_type, year, &ext);

    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Cannot create directory {}", dir.display()))?;
    let file_path = dir.join(&filename);
    fs::write(&file_path, &data)
        .await
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    info!("Successfully downloaded to {}", file_path.display());
    Ok(DownloadRecord {
        company: company.to_string(),
        doc_type,
        year,
        file_path,
        filename,
        url: candidate.url.clone(),
        sha256,
        mimetype: mimetype.unwrap_or_default(),
        source: candidate.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use tempfile::TempDir;

    struct StaticFetcher(Option<String>);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
            if url.contains("broken") {
                return Err(anyhow!("connection reset"));
            }
            Ok((b"%PDF-1.7 test".to_vec(), self.0.clone()))
        }
    }

    fn candidate(url: &str) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: "Apple Annual Report 2023".to_string(),
            year: Some(2023),
            mimetype: Some("application/pdf".to_string()),
            source: Source::WebSearch,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime(Some("application/pdf")), ".pdf");
        assert_eq!(extension_for_mime(Some("application/pdf; charset=binary")), ".pdf");
        assert_eq!(extension_for_mime(Some("text/csv")), ".csv");
        assert_eq!(extension_for_mime(None), ".bin");
        assert_eq!(extension_for_mime(Some("application/x-unknown-thing")), ".bin");
    }

    #[test]
    fn test_build_path() {
        let (dir, filename) = build_path(Path::new("/data"), "Apple Inc.", DocType::AnnualReport, Some(2023), ".pdf");
        assert_eq!(dir, PathBuf::from("/data/apple_inc/annual_report/2023"));
        assert_eq!(filename, "apple_inc_annual_report_2023.pdf");

        let (dir, filename) = build_path(Path::new("/data"), "Apple", DocType::TenK, None, ".bin");
        assert_eq!(dir, PathBuf::from("/data/apple/10_k/unknown"));
        assert_eq!(filename, "apple_10_k.bin");
    }

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex(b"abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[tokio::test]
    async fn test_download_one_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher(Some("application/pdf".to_string()));

        let record = download_one(
            &fetcher,
            temp_dir.path(),
            "Apple",
            DocType::AnnualReport,
            Some(2023),
            &candidate("https://apple.com/ar.pdf"),
        )
        .await
        .unwrap();

        assert!(record.file_path.exists());
        assert_eq!(record.filename, "apple_annual_report_2023.pdf");
        assert_eq!(record.sha256, sha256_hex(b"%PDF-1.7 test"));
        assert_eq!(record.mimetype, "application/pdf");
        assert_eq!(std::fs::read(&record.file_path).unwrap(), b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_download_one_propagates_fetch_error() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher(None);
        let result = download_one(
            &fetcher,
            temp_dir.path(),
            "Apple",
            DocType::AnnualReport,
            None,
            &candidate("https://apple.com/broken.pdf"),
        )
        .await;
        assert!(result.is_err());
        assert!(!temp_dir.path().join("apple").exists());
    }
}
