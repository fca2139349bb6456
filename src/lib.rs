//! irfetch: resolve natural-language requests for company financial documents
//! into downloaded files.
//!
//! The core pipeline is prompt parsing ([`parser`]), multi-source search
//! ([`aggregator`] over [`sources`]), company matching ([`matcher`]),
//! per-candidate validation ([`validator`]) and per-year selection
//! ([`selector`]), driven end to end by [`pipeline::Pipeline`].

pub mod aggregator;
pub mod config;
pub mod downloader;
pub mod errors;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod selector;
pub mod sources;
pub mod storage;
pub mod text;
pub mod ticker;
pub mod validator;

pub use errors::SourceError;
pub use models::{Candidate, DocType, DownloadRecord, FetchRequest, FetchResponse, Intent};
pub use pipeline::Pipeline;
