use async_trait::async_trait;

use crate::{
    AnalysisFields, AnalysisSource, ArticleText, CandidateItem, Interest, NewsRecord,
    NewsletterResult, Subscriber,
};

/// Read access to the two interest relations.
#[async_trait]
pub trait InterestStore: Send + Sync {
    /// All index and stock interests recorded for a user.
    async fn interests_for(&self, user_id: &str) -> NewsletterResult<Vec<Interest>>;
}

/// Read access to stored news articles.
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Up to `limit` most-recent articles for a ticker, newest first.
    async fn recent_items(
        &self,
        ticker: &str,
        limit: usize,
        source: AnalysisSource,
    ) -> NewsletterResult<Vec<NewsRecord>>;
}

/// Users who opted in to receive the newsletter.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn opted_in_subscribers(&self) -> NewsletterResult<Vec<Subscriber>>;
}

/// Remote article summarization. Results are positionally aligned with the
/// submitted articles.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        subject: &str,
        articles: &[ArticleText],
    ) -> NewsletterResult<Vec<AnalysisFields>>;
}

/// Renders and sends a digest to one subscriber.
#[async_trait]
pub trait DigestDelivery: Send + Sync {
    async fn deliver(&self, subscriber: &Subscriber, items: &[CandidateItem])
        -> NewsletterResult<()>;
    fn name(&self) -> &str;
}
