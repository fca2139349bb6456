use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{DownloadRecord, DocType, Source};
use crate::text::safe_name;

/// Persists metadata for downloaded documents.
#[async_trait]
pub trait MetadataSink: Send + Sync {
    /// Store a record; returns `false` when a record with the same content
    /// hash already exists, which is not an error.
    async fn record(&self, record: &DownloadRecord) -> Result<bool>;
}

/// Filters for [`Storage::search_records`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Substring of the company name.
    pub company: Option<String>,
    pub doc_type: Option<DocType>,
    pub year: Option<i32>,
}

/// A stored record together with the time it was indexed.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    #[serde(flatten)]
    pub record: DownloadRecord,
    pub indexed_at: i64,
}

pub struct Storage {
    pool: SqlitePool,
    metadata_dir: Option<PathBuf>,
}

impl Storage {
    pub async fn new(database_path: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path)
                .with_context(|| format!("Cannot create database file {}", database_path))?;
        }

        // One connection serializes writers on the embedded database
        let database_url = format!("sqlite://{}", database_path);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS downloads (
                sha256 TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                doc_type TEXT NOT NULL,
                year INTEGER,
                file_path TEXT NOT NULL,
                filename TEXT NOT NULL,
                url TEXT NOT NULL,
                mimetype TEXT NOT NULL,
                source TEXT NOT NULL,
                indexed_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_downloads_company ON downloads(company);
            CREATE INDEX IF NOT EXISTS idx_downloads_doc_type ON downloads(doc_type);
            CREATE INDEX IF NOT EXISTS idx_downloads_year ON downloads(year);
            "#
        )
        .execute(&pool)
        .await?;

        Ok(Storage { pool, metadata_dir: None })
    }

    /// Also write a JSON sidecar per new record into `dir`.
    pub fn with_metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    pub async fn insert_record(&self, record: &DownloadRecord) -> Result<bool> {
        let indexed_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO downloads
            (sha256, company, doc_type, year, file_path, filename, url, mimetype, source, indexed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&record.sha256)
        .bind(&record.company)
        .bind(record.doc_type.as_str())
        .bind(record.year)
        .bind(record.file_path.to_string_lossy().to_string())
        .bind(&record.filename)
        .bind(&record.url)
        .bind(&record.mimetype)
        .bind(record.source.as_str())
        .bind(indexed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Metadata for {} already stored (sha256 {})", record.url, record.sha256);
            return Ok(false);
        }

        if let Some(dir) = &self.metadata_dir {
            let stored = StoredRecord { record: record.clone(), indexed_at };
            let path = write_sidecar(dir, &stored).await?;
            debug!("Wrote metadata sidecar {}", path.display());
        }
        Ok(true)
    }

    pub async fn list_records(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        self.search_records(&RecordQuery::default(), limit).await
    }

    /// Most recent records matching every filter that is set.
    pub async fn search_records(&self, query: &RecordQuery, limit: usize) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM downloads
            WHERE (?1 IS NULL OR company LIKE ?1)
              AND (?2 IS NULL OR doc_type = ?2)
              AND (?3 IS NULL OR year = ?3)
            ORDER BY indexed_at DESC, company
            LIMIT ?4
            "#
        )
        .bind(query.company.as_ref().map(|c| format!("%{}%", c)))
        .bind(query.doc_type.map(|d| d.as_str()))
        .bind(query.year)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::new();
        for row in rows {
            let doc_type_str: String = row.get("doc_type");
            let source_str: String = row.get("source");

            let doc_type = parse_doc_type(&doc_type_str)
                .with_context(|| format!("Unknown doc_type in database: {}", doc_type_str))?;
            let source = parse_source(&source_str)
                .with_context(|| format!("Unknown source in database: {}", source_str))?;

            records.push(StoredRecord {
                record: DownloadRecord {
                    company: row.get("company"),
                    doc_type,
                    year: row.get("year"),
                    file_path: row.get::<String, _>("file_path").into(),
                    filename: row.get("filename"),
                    url: row.get("url"),
                    sha256: row.get("sha256"),
                    mimetype: row.get("mimetype"),
                    source,
                },
                indexed_at: row.get("indexed_at"),
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl MetadataSink for Storage {
    async fn record(&self, record: &DownloadRecord) -> Result<bool> {
        let stored = self.insert_record(record).await?;
        if stored {
            info!("Recorded metadata for {}", record.file_path.display());
        }
        Ok(stored)
    }
}

/// Doc type from its stored (canonical) string.
pub fn parse_doc_type(value: &str) -> Option<DocType> {
    [
        DocType::AnnualReport,
        DocType::TenK,
        DocType::TenQ,
        DocType::TwentyF,
        DocType::FinancialStatements,
        DocType::EarningsRelease,
        DocType::InvestorPresentation,
    ]
    .into_iter()
    .find(|d| d.as_str() == value)
}

fn parse_source(value: &str) -> Option<Source> {
    [Source::WebSearch, Source::Filings, Source::InvestorRelations]
        .into_iter()
        .find(|s| s.as_str() == value)
}

async fn write_sidecar(dir: &Path, stored: &StoredRecord) -> Result<PathBuf> {
    let record = &stored.record;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create metadata directory {}", dir.display()))?;

    let year = record.year.map(|y| y.to_string()).unwrap_or_else(|| "unknown".to_string());
    let short_hash: String = record.sha256.chars().take(8).collect();
    let name = format!(
        "{}.json",
        safe_name(&[record.company.as_str(), record.doc_type.as_str(), year.as_str(), short_hash.as_str()])
    );
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(stored)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

// Public convenience functions
pub async fn search_records(database_path: &str, query: &RecordQuery, limit: usize) -> Result<Vec<StoredRecord>> {
    let storage = Storage::new(database_path).await?;
    storage.search_records(query, limit).await
}
