pub mod error;

pub use error::{SummarizerError, SummarizerResult};

use std::time::Duration;

use async_trait::async_trait;
use newsletter_core::{AnalysisFields, ArticleText, NewsletterError, NewsletterResult, Summarizer};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const SUMMARIZE_PATH: &str = "/summarize";

#[derive(Debug, Clone, Serialize)]
struct SummarizeRequest<'a> {
    subject: &'a str,
    articles: &'a [ArticleText],
}

#[derive(Debug, Clone, Deserialize)]
struct SummarizeResponse {
    results: Vec<AnalysisFields>,
}

/// Configuration for the summarization service
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl SummarizerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(newsletter_core::SUMMARIZER_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the LLM summarization backend.
#[derive(Clone)]
pub struct SummarizerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SummarizerClient {
    pub fn new(config: SummarizerConfig) -> SummarizerResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Summarize a batch of articles about one subject. The results line up
    /// one-to-one with `articles`.
    pub async fn summarize_batch(
        &self,
        subject: &str,
        articles: &[ArticleText],
    ) -> SummarizerResult<Vec<AnalysisFields>> {
        let request = SummarizeRequest { subject, articles };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, SUMMARIZE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizerError::Timeout
                } else {
                    SummarizerError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::GATEWAY_TIMEOUT {
            return Err(SummarizerError::GatewayTimeout);
        }
        if !status.is_success() {
            return Err(SummarizerError::ServiceUnavailable(format!(
                "Status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SummarizerError::Timeout
            } else {
                SummarizerError::RequestFailed(e)
            }
        })?;
        let parsed: SummarizeResponse = serde_json::from_str(&body)
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;

        if parsed.results.len() != articles.len() {
            return Err(SummarizerError::InvalidResponse(format!(
                "expected {} results, got {}",
                articles.len(),
                parsed.results.len()
            )));
        }

        Ok(parsed.results)
    }

    /// Check service health
    pub async fn health(&self) -> SummarizerResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Summarizer for SummarizerClient {
    async fn summarize(
        &self,
        subject: &str,
        articles: &[ArticleText],
    ) -> NewsletterResult<Vec<AnalysisFields>> {
        self.summarize_batch(subject, articles)
            .await
            .map_err(|e| match e {
                SummarizerError::Timeout => NewsletterError::Timeout(self.timeout),
                other => other.into(),
            })
    }
}
