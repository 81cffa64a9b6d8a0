use std::sync::Arc;

use async_trait::async_trait;
use newsletter_core::{
    CandidateCollector, CandidateItem, DigestDelivery, NewsletterResult, SelectionPolicy,
    Subscriber, SubscriberStore,
};
use serde::Serialize;

/// Outcome counts of one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    /// Subscribers with no qualifying summaries this cycle
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Sent(usize),
    NoSummaries,
}

/// Runs collection, selection and delivery for every opted-in subscriber.
pub struct Dispatcher {
    subscribers: Arc<dyn SubscriberStore>,
    collector: CandidateCollector,
    policy: SelectionPolicy,
    delivery: Arc<dyn DigestDelivery>,
}

impl Dispatcher {
    pub fn new(
        subscribers: Arc<dyn SubscriberStore>,
        collector: CandidateCollector,
        policy: SelectionPolicy,
        delivery: Arc<dyn DigestDelivery>,
    ) -> Self {
        Self {
            subscribers,
            collector,
            policy,
            delivery,
        }
    }

    /// The items a user's digest would contain right now.
    pub async fn digest_for(&self, user_id: &str) -> NewsletterResult<Vec<CandidateItem>> {
        let pool = self.collector.collect(user_id).await?;
        Ok(self.policy.select(pool))
    }

    async fn dispatch_one(&self, subscriber: &Subscriber) -> NewsletterResult<Outcome> {
        let items = self.digest_for(&subscriber.id).await?;
        if items.is_empty() {
            return Ok(Outcome::NoSummaries);
        }
        self.delivery.deliver(subscriber, &items).await?;
        Ok(Outcome::Sent(items.len()))
    }

    /// One pass over all subscribers. A failing subscriber is logged and
    /// counted; it never stops the others.
    pub async fn run_cycle(&self) -> NewsletterResult<DispatchReport> {
        let subscribers = self.subscribers.opted_in_subscribers().await?;
        tracing::info!(
            "Dispatching newsletter to {} subscribers via {} ({})",
            subscribers.len(),
            self.delivery.name(),
            self.collector.strategy_name()
        );

        let mut report = DispatchReport::default();
        for subscriber in &subscribers {
            match self.dispatch_one(subscriber).await {
                Ok(Outcome::Sent(count)) => {
                    tracing::debug!("Delivered {} items to {}", count, subscriber.email);
                    report.sent += 1;
                }
                Ok(Outcome::NoSummaries) => {
                    tracing::info!("No summaries available for user {}", subscriber.email);
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to send newsletter to {}: {}", subscriber.email, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Dispatch complete: {} sent, {} skipped, {} failed",
            report.sent,
            report.skipped,
            report.failed
        );
        Ok(report)
    }
}

/// Delivery used when no SMTP server is configured: logs what would be sent.
pub struct LogOnlyDelivery;

#[async_trait]
impl DigestDelivery for LogOnlyDelivery {
    async fn deliver(&self, subscriber: &Subscriber, items: &[CandidateItem]) -> NewsletterResult<()> {
        tracing::info!(
            "[dry-run] Digest for {} with {} items",
            subscriber.email,
            items.len()
        );
        for item in items {
            tracing::info!("[dry-run]   {} | {}", item.ticker, item.title);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log-only"
    }
}
