//! Multi-source search with priority ordering, early exit, de-duplication and ranking

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{Candidate, DocType, Intent};
use crate::sources::SourceAdapter;

/// Fewer candidates than this after a stage triggers the next fallback source.
pub const ENOUGH_CANDIDATES: usize = 5;

pub struct SearchAggregator {
    web: Arc<dyn SourceAdapter>,
    filings: Arc<dyn SourceAdapter>,
    investor_relations: Arc<dyn SourceAdapter>,
}

impl SearchAggregator {
    pub fn new(
        web: Arc<dyn SourceAdapter>,
        filings: Arc<dyn SourceAdapter>,
        investor_relations: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self {
            web,
            filings,
            investor_relations,
        }
    }

    /// Query sources in priority order and return unique candidates ranked
    /// by confidence, highest first.
    pub async fn aggregate(&self, intent: &Intent) -> Vec<Candidate> {
        let intent = Arc::new(intent.clone());
        let mut all = Vec::new();

        all.extend(run_adapter(&self.web, &intent).await);

        if all.len() < ENOUGH_CANDIDATES
            && matches!(intent.doc_type, DocType::TenK | DocType::AnnualReport)
        {
            all.extend(run_adapter(&self.filings, &intent).await);
        }

        if all.len() < ENOUGH_CANDIDATES {
            all.extend(run_adapter(&self.investor_relations, &intent).await);
        }

        let ranked = dedupe_and_rank(all);
        info!("Total unique documents found: {}", ranked.len());
        ranked
    }
}

/// Run one adapter on its own task so slow network calls never hold up the
/// caller's executor thread. Any failure, including a panic, yields nothing.
async fn run_adapter(adapter: &Arc<dyn SourceAdapter>, intent: &Arc<Intent>) -> Vec<Candidate> {
    let source = adapter.source();
    let task_adapter = Arc::clone(adapter);
    let task_intent = Arc::clone(intent);

    let handle = tokio::spawn(async move { task_adapter.search(&task_intent).await });
    match handle.await {
        Ok(Ok(hits)) => {
            if !hits.is_empty() {
                info!("{} found {} documents", source.as_str(), hits.len());
            }
            hits
        }
        Ok(Err(e)) => {
            warn!("{} search failed: {}", source.as_str(), e);
            vec![]
        }
        Err(e) => {
            warn!("{} search task aborted: {}", source.as_str(), e);
            vec![]
        }
    }
}

/// First occurrence of each URL wins; stable sort by confidence descending.
pub fn dedupe_and_rank(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect();
    unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    unique
}
