//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    AnalysisFields, AnalysisSource, ArticleText, Interest, InterestKind, InterestStore,
    NewsRecord, NewsStore, NewsletterError, NewsletterResult, Summarizer,
};

pub fn raw(id: &str, ticker: &str, title: &str) -> NewsRecord {
    NewsRecord {
        id: id.to_string(),
        ticker: ticker.to_string(),
        title: title.to_string(),
        article: Some(format!("body of {title}")),
        real_url: Some(format!("https://news.example.com/{id}")),
        analysis: None,
    }
}

pub fn analyzed(id: &str, ticker: &str, title: &str, summary: &str, importance: &str) -> NewsRecord {
    NewsRecord {
        analysis: Some(AnalysisFields {
            summary: Some(summary.to_string()),
            importance: Some(importance.into()),
            arousal: Some("0.5".into()),
            valence: Some("0.5".into()),
        }),
        ..raw(id, ticker, title)
    }
}

#[derive(Default)]
pub struct FakeInterestStore {
    rows: Vec<Interest>,
}

impl FakeInterestStore {
    pub fn with(mut self, user_id: &str, ticker: &str, kind: InterestKind) -> Self {
        self.rows.push(Interest {
            user_id: user_id.to_string(),
            ticker: ticker.to_string(),
            kind,
        });
        self
    }
}

#[async_trait]
impl InterestStore for FakeInterestStore {
    async fn interests_for(&self, user_id: &str) -> NewsletterResult<Vec<Interest>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeNewsStore {
    joined: HashMap<String, Vec<NewsRecord>>,
    inline: HashMap<String, Vec<NewsRecord>>,
    raw: HashMap<String, Vec<NewsRecord>>,
    broken: HashSet<String>,
}

impl FakeNewsStore {
    pub fn with_joined(mut self, ticker: &str, rows: Vec<NewsRecord>) -> Self {
        self.joined.insert(ticker.to_string(), rows);
        self
    }

    pub fn with_inline(mut self, ticker: &str, rows: Vec<NewsRecord>) -> Self {
        self.inline.insert(ticker.to_string(), rows);
        self
    }

    pub fn with_raw(mut self, ticker: &str, rows: Vec<NewsRecord>) -> Self {
        self.raw.insert(ticker.to_string(), rows);
        self
    }

    /// Reads for this ticker fail as if the store were unreachable.
    pub fn broken_for(mut self, ticker: &str) -> Self {
        self.broken.insert(ticker.to_string());
        self
    }
}

#[async_trait]
impl NewsStore for FakeNewsStore {
    async fn recent_items(
        &self,
        ticker: &str,
        limit: usize,
        source: AnalysisSource,
    ) -> NewsletterResult<Vec<NewsRecord>> {
        if self.broken.contains(ticker) {
            return Err(NewsletterError::Store("connection reset".into()));
        }
        let table = match source {
            AnalysisSource::Joined => &self.joined,
            AnalysisSource::Inline => &self.inline,
            AnalysisSource::None => &self.raw,
        };
        Ok(table
            .get(ticker)
            .map(|rows| rows.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

enum Reply {
    Echo,
    Fixed(Vec<AnalysisFields>),
}

#[derive(Clone)]
pub struct FakeSummarizer {
    reply: Arc<Reply>,
    failing: Arc<HashSet<String>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSummarizer {
    /// Summarizes every article as "summary of <title>".
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    pub fn fixed(results: Vec<AnalysisFields>) -> Self {
        Self::with_reply(Reply::Fixed(results))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply: Arc::new(reply),
            failing: Arc::new(HashSet::new()),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_for(mut self, subjects: &[&str]) -> Self {
        self.failing = Arc::new(subjects.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        subject: &str,
        articles: &[ArticleText],
    ) -> NewsletterResult<Vec<AnalysisFields>> {
        self.calls.lock().unwrap().push(subject.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(subject) {
            return Err(NewsletterError::Summarizer("connection refused".into()));
        }
        Ok(match self.reply.as_ref() {
            Reply::Echo => articles
                .iter()
                .map(|a| AnalysisFields {
                    summary: Some(format!("summary of {}", a.title)),
                    importance: Some(0.5.into()),
                    arousal: Some(0.5.into()),
                    valence: Some(0.5.into()),
                })
                .collect(),
            Reply::Fixed(results) => results.clone(),
        })
    }
}
