//! Per-ticker candidate retrieval strategies.
//!
//! [`PrecomputedJoin`] is the default: it reads summaries that an upstream
//! pipeline already wrote to the analysis table. [`PrecomputedSingleTable`]
//! reads the same fields from the article row. [`RemoteSummarization`] calls
//! the summarization service once per ticker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{NewsletterError, NewsletterResult};
use crate::score::try_parse_score;
use crate::traits::{NewsStore, Summarizer};
use crate::types::{AnalysisFields, AnalysisSource, ArticleText, CandidateItem, NewsRecord};

/// Produces the candidate items of a single ticker.
#[async_trait]
pub trait CollectionStrategy: Send + Sync {
    async fn collect_ticker(&self, ticker: &str, limit: usize)
        -> NewsletterResult<Vec<CandidateItem>>;
    fn name(&self) -> &str;
}

/// Log scores that will be coerced to the default during ranking.
fn log_malformed_scores(record_id: &str, analysis: &AnalysisFields) {
    for (field, raw) in [
        ("importance", &analysis.importance),
        ("arousal", &analysis.arousal),
        ("valence", &analysis.valence),
    ] {
        if raw.is_some() && try_parse_score(raw.as_ref()).is_none() {
            tracing::debug!(
                "Article {} has unparsable {} {:?}, ranking it as 0.0",
                record_id,
                field,
                raw
            );
        }
    }
}

fn records_to_candidates(records: Vec<NewsRecord>) -> Vec<CandidateItem> {
    records
        .into_iter()
        .filter_map(|mut record| {
            let analysis = record.analysis.take()?;
            log_malformed_scores(&record.id, &analysis);
            Some(CandidateItem::from_record(record, analysis))
        })
        .collect()
}

/// Articles joined with the precomputed analysis table. No network access.
pub struct PrecomputedJoin {
    store: Arc<dyn NewsStore>,
}

impl PrecomputedJoin {
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CollectionStrategy for PrecomputedJoin {
    async fn collect_ticker(
        &self,
        ticker: &str,
        limit: usize,
    ) -> NewsletterResult<Vec<CandidateItem>> {
        let records = self
            .store
            .recent_items(ticker, limit, AnalysisSource::Joined)
            .await?;
        tracing::info!("Retrieved {} analyzed articles for {}", records.len(), ticker);
        Ok(records_to_candidates(records))
    }

    fn name(&self) -> &str {
        "precomputed-join"
    }
}

/// Articles that carry their own analysis columns.
pub struct PrecomputedSingleTable {
    store: Arc<dyn NewsStore>,
}

impl PrecomputedSingleTable {
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CollectionStrategy for PrecomputedSingleTable {
    async fn collect_ticker(
        &self,
        ticker: &str,
        limit: usize,
    ) -> NewsletterResult<Vec<CandidateItem>> {
        let records = self
            .store
            .recent_items(ticker, limit, AnalysisSource::Inline)
            .await?;
        tracing::info!("Retrieved {} summarized articles for {}", records.len(), ticker);
        Ok(records_to_candidates(records))
    }

    fn name(&self) -> &str {
        "precomputed-single-table"
    }
}

/// Raw articles summarized on demand, one request per ticker.
pub struct RemoteSummarization {
    store: Arc<dyn NewsStore>,
    summarizer: Arc<dyn Summarizer>,
    timeout: Duration,
}

impl RemoteSummarization {
    pub fn new(store: Arc<dyn NewsStore>, summarizer: Arc<dyn Summarizer>, timeout: Duration) -> Self {
        Self {
            store,
            summarizer,
            timeout,
        }
    }
}

#[async_trait]
impl CollectionStrategy for RemoteSummarization {
    async fn collect_ticker(
        &self,
        ticker: &str,
        limit: usize,
    ) -> NewsletterResult<Vec<CandidateItem>> {
        let records = self
            .store
            .recent_items(ticker, limit, AnalysisSource::None)
            .await?;
        if records.is_empty() {
            tracing::info!("No articles to summarize for {}", ticker);
            return Ok(Vec::new());
        }

        let articles: Vec<ArticleText> = records.iter().map(ArticleText::from).collect();
        let results = tokio::time::timeout(self.timeout, self.summarizer.summarize(ticker, &articles))
            .await
            .map_err(|_| NewsletterError::Timeout(self.timeout))??;

        if results.len() != records.len() {
            return Err(NewsletterError::InvalidResponse(format!(
                "{} results for {} articles",
                results.len(),
                records.len()
            )));
        }

        tracing::info!("Summarized {} articles for {}", results.len(), ticker);
        let candidates = records
            .into_iter()
            .zip(results)
            .map(|(record, analysis)| {
                log_malformed_scores(&record.id, &analysis);
                CandidateItem::from_record(record, analysis)
            })
            .collect();
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "remote-summarization"
    }
}
