//! Candidate collection for a single user.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::NewsletterResult;
use crate::strategy::CollectionStrategy;
use crate::traits::InterestStore;
use crate::types::CandidateItem;
use crate::ARTICLES_PER_TICKER;

/// Resolves a user's tickers and gathers their candidate items.
///
/// Tickers are fetched concurrently. A transient failure on one ticker (remote
/// timeout, bad response) is logged and that ticker contributes nothing; a
/// systemic failure such as the store going away aborts the whole collection.
#[derive(Clone)]
pub struct CandidateCollector {
    interests: Arc<dyn InterestStore>,
    strategy: Arc<dyn CollectionStrategy>,
    articles_per_ticker: usize,
}

impl CandidateCollector {
    pub fn new(interests: Arc<dyn InterestStore>, strategy: Arc<dyn CollectionStrategy>) -> Self {
        Self {
            interests,
            strategy,
            articles_per_ticker: ARTICLES_PER_TICKER,
        }
    }

    pub fn with_articles_per_ticker(mut self, limit: usize) -> Self {
        self.articles_per_ticker = limit;
        self
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Union of the user's index and stock interests, sorted. Tickers compare
    /// as exact strings; only empty ones are dropped.
    pub async fn tickers_for(&self, user_id: &str) -> NewsletterResult<BTreeSet<String>> {
        let interests = self.interests.interests_for(user_id).await?;
        Ok(interests
            .into_iter()
            .map(|i| i.ticker)
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Flattened candidate pool for a user, in ticker order.
    pub async fn collect(&self, user_id: &str) -> NewsletterResult<Vec<CandidateItem>> {
        let tickers = self.tickers_for(user_id).await?;
        tracing::info!("Interested tickers for user {}: {:?}", user_id, tickers);

        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = tickers.iter().map(|ticker| {
            let strategy = &self.strategy;
            let limit = self.articles_per_ticker;
            async move { (ticker, strategy.collect_ticker(ticker, limit).await) }
        });
        let results = futures::future::join_all(fetches).await;

        let mut candidates = Vec::new();
        for (ticker, result) in results {
            match result {
                Ok(items) => candidates.extend(items),
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        "Skipping {} for user {} via {}: {}",
                        ticker,
                        user_id,
                        self.strategy.name(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            "Collected {} candidates across {} tickers for user {}",
            candidates.len(),
            tickers.len(),
            user_id
        );
        Ok(candidates)
    }
}
