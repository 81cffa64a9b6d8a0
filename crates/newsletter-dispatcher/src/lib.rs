pub mod config;
pub mod dispatch;

pub use config::{DispatcherConfig, StrategyKind};
pub use dispatch::{DispatchReport, Dispatcher, LogOnlyDelivery};

use std::sync::Arc;

use anyhow::{Context, Result};
use news_store::NewsDb;
use newsletter_core::{
    CandidateCollector, CollectionStrategy, DigestDelivery, PrecomputedJoin,
    PrecomputedSingleTable, RemoteSummarization,
};
use summarizer_client::{SummarizerClient, SummarizerConfig};

/// Build the configured collection strategy on top of `db`.
pub fn build_strategy(config: &DispatcherConfig, db: &NewsDb) -> Result<Arc<dyn CollectionStrategy>> {
    let store = Arc::new(db.clone());
    let strategy: Arc<dyn CollectionStrategy> = match config.strategy {
        StrategyKind::Join => Arc::new(PrecomputedJoin::new(store)),
        StrategyKind::SingleTable => Arc::new(PrecomputedSingleTable::new(store)),
        StrategyKind::Remote => {
            let base_url = config
                .llm_server_url
                .clone()
                .context("LLM_SERVER_URL not set")?;
            let client = SummarizerClient::new(
                SummarizerConfig::new(base_url).with_timeout(config.summarizer_timeout),
            )?;
            Arc::new(RemoteSummarization::new(
                store,
                Arc::new(client),
                config.summarizer_timeout,
            ))
        }
    };
    Ok(strategy)
}

/// Run one dispatch cycle against `db`.
pub async fn run_cycle_with(
    config: &DispatcherConfig,
    db: &NewsDb,
    delivery: Arc<dyn DigestDelivery>,
) -> Result<DispatchReport> {
    let strategy = build_strategy(config, db)?;
    let store = Arc::new(db.clone());
    let collector = CandidateCollector::new(store.clone(), strategy)
        .with_articles_per_ticker(config.articles_per_ticker);
    let dispatcher = Dispatcher::new(store, collector, config.policy, delivery);

    Ok(dispatcher.run_cycle().await?)
}

/// Open the database for the duration of one cycle, run it and close the pool.
pub async fn run_cycle(config: &DispatcherConfig, delivery: Arc<dyn DigestDelivery>) -> Result<DispatchReport> {
    let db = NewsDb::connect(&config.database_url).await?;

    if let Some(dir) = &config.ticker_catalog_dir {
        if let Err(e) = db.seed_catalog_dir(dir).await {
            tracing::warn!("Failed to seed ticker catalog from {}: {}", dir.display(), e);
        }
    }

    let result = run_cycle_with(config, &db, delivery).await;
    db.close().await;
    result
}
