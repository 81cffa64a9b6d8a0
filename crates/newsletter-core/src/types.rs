use serde::{Deserialize, Serialize};

use crate::score::{parse_score, ScoreKey};

/// The two disjoint interest relations a user can hold a ticker in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestKind {
    Index,
    Stock,
}

impl InterestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestKind::Index => "index",
            InterestKind::Stock => "stock",
        }
    }
}

/// A (user, ticker) row from one of the interest relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interest {
    pub user_id: String,
    pub ticker: String,
    pub kind: InterestKind,
}

/// A user who opted in to the newsletter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Subscriber {
    /// Name used in the digest greeting, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Importance/arousal/valence exactly as a store or the summarization service
/// handed it over. Stores keep these as text; the service may send numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Number(f64),
    Text(String),
    /// Any other JSON value (bool, null, array, object). Ranks as 0.0;
    /// `true` is not read as 1.0.
    Other(serde_json::Value),
}

impl From<f64> for RawScore {
    fn from(value: f64) -> Self {
        RawScore::Number(value)
    }
}

impl From<&str> for RawScore {
    fn from(value: &str) -> Self {
        RawScore::Text(value.to_string())
    }
}

impl From<String> for RawScore {
    fn from(value: String) -> Self {
        RawScore::Text(value)
    }
}

/// Analysis attached to an article, either precomputed or returned by the
/// summarization service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub importance: Option<RawScore>,
    #[serde(default)]
    pub arousal: Option<RawScore>,
    #[serde(default)]
    pub valence: Option<RawScore>,
}

/// Where a news store should read analysis fields from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Inner join against the precomputed analysis table.
    Joined,
    /// Analysis columns stored on the article row itself.
    Inline,
    /// Raw articles only.
    None,
}

/// An article as read from the news store, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub ticker: String,
    pub title: String,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub real_url: Option<String>,
    #[serde(default)]
    pub analysis: Option<AnalysisFields>,
}

/// One article as submitted to the summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleText {
    pub title: String,
    pub article: String,
}

impl From<&NewsRecord> for ArticleText {
    fn from(record: &NewsRecord) -> Self {
        Self {
            title: record.title.clone(),
            article: record.article.clone().unwrap_or_default(),
        }
    }
}

/// A news item eligible for one user's digest. Lives for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub ticker: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub importance: Option<RawScore>,
    #[serde(default)]
    pub arousal: Option<RawScore>,
    #[serde(default)]
    pub valence: Option<RawScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_url: Option<String>,
}

impl CandidateItem {
    pub fn new(ticker: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            title: title.into(),
            summary: None,
            importance: None,
            arousal: None,
            valence: None,
            real_url: None,
        }
    }

    /// Combine a stored article with its analysis.
    pub fn from_record(record: NewsRecord, analysis: AnalysisFields) -> Self {
        Self {
            ticker: record.ticker,
            title: record.title,
            summary: analysis.summary,
            importance: analysis.importance,
            arousal: analysis.arousal,
            valence: analysis.valence,
            real_url: record.real_url.filter(|u| !u.is_empty()),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_scores(
        mut self,
        importance: impl Into<RawScore>,
        arousal: impl Into<RawScore>,
        valence: impl Into<RawScore>,
    ) -> Self {
        self.importance = Some(importance.into());
        self.arousal = Some(arousal.into());
        self.valence = Some(valence.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.real_url = Some(url.into());
        self
    }

    /// Character count of the summary; a missing summary counts as empty.
    pub fn summary_len(&self) -> usize {
        self.summary.as_deref().map_or(0, |s| s.chars().count())
    }

    pub fn importance_value(&self) -> f64 {
        parse_score(self.importance.as_ref())
    }

    pub fn arousal_value(&self) -> f64 {
        parse_score(self.arousal.as_ref())
    }

    pub fn valence_value(&self) -> f64 {
        parse_score(self.valence.as_ref())
    }

    pub fn score_key(&self) -> ScoreKey {
        ScoreKey::from(self)
    }
}
