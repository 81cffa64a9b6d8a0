use anyhow::Result;
use async_trait::async_trait;
use newsletter_core::{
    AnalysisFields, AnalysisSource, NewsRecord, NewsStore, NewsletterResult, RawScore,
};
use serde::{Deserialize, Serialize};

use crate::db::{store_err, NewsDb};

/// Article as written by the ingestion pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewArticle {
    pub id: String,
    pub ticker: String,
    /// ISO date (YYYY-MM-DD)
    pub date: Option<String>,
    pub title: String,
    pub article: Option<String>,
    pub real_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: String,
    ticker: String,
    title: Option<String>,
    article: Option<String>,
    real_url: Option<String>,
    summary: Option<String>,
    importance: Option<String>,
    arousal: Option<String>,
    valence: Option<String>,
}

impl NewsRow {
    fn into_record(self, with_analysis: bool) -> NewsRecord {
        let analysis = with_analysis.then(|| AnalysisFields {
            summary: self.summary,
            importance: self.importance.map(RawScore::Text),
            arousal: self.arousal.map(RawScore::Text),
            valence: self.valence.map(RawScore::Text),
        });
        NewsRecord {
            id: self.id,
            ticker: self.ticker,
            title: self.title.unwrap_or_default(),
            article: self.article,
            real_url: self.real_url,
            analysis,
        }
    }
}

const JOINED_QUERY: &str = r#"
    SELECT a.id, a.ticker, a.title, a.article, a.real_url,
           l.summary, l.importance, l.arousal, l.valence
    FROM news_articles a
    JOIN llm_news l ON a.id = l.id
    WHERE a.ticker = ?
    ORDER BY a.date DESC, a.id DESC
    LIMIT ?
"#;

const INLINE_QUERY: &str = r#"
    SELECT id, ticker, title, article, real_url,
           summary, importance, arousal, valence
    FROM news_articles
    WHERE ticker = ? AND summary IS NOT NULL
    ORDER BY date DESC, id DESC
    LIMIT ?
"#;

/// Raw articles regardless of analysis state.
const RAW_QUERY: &str = r#"
    SELECT id, ticker, title, article, real_url,
           summary, importance, arousal, valence
    FROM news_articles
    WHERE ticker = ?
    ORDER BY date DESC, id DESC
    LIMIT ?
"#;

impl NewsDb {
    pub async fn insert_article(&self, article: &NewArticle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news_articles (id, ticker, date, title, article, real_url)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.id)
        .bind(&article.ticker)
        .bind(&article.date)
        .bind(&article.title)
        .bind(&article.article)
        .bind(&article.real_url)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Store analysis in the precomputed `llm_news` table.
    pub async fn insert_analysis(&self, id: &str, subject: &str, analysis: &AnalysisFields) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO llm_news (id, subject, summary, importance, arousal, valence)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(subject)
        .bind(&analysis.summary)
        .bind(score_text(&analysis.importance))
        .bind(score_text(&analysis.arousal))
        .bind(score_text(&analysis.valence))
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Store analysis on the article row itself.
    pub async fn update_inline_analysis(&self, id: &str, analysis: &AnalysisFields) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE news_articles
            SET summary = ?, importance = ?, arousal = ?, valence = ?
            WHERE id = ?
            "#,
        )
        .bind(&analysis.summary)
        .bind(score_text(&analysis.importance))
        .bind(score_text(&analysis.arousal))
        .bind(score_text(&analysis.valence))
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}

/// Scores are persisted as text, as the ingestion pipeline writes them.
fn score_text(raw: &Option<RawScore>) -> Option<String> {
    raw.as_ref().map(|score| match score {
        RawScore::Number(n) => n.to_string(),
        RawScore::Text(s) => s.clone(),
        RawScore::Other(v) => v.to_string(),
    })
}

#[async_trait]
impl NewsStore for NewsDb {
    async fn recent_items(
        &self,
        ticker: &str,
        limit: usize,
        source: AnalysisSource,
    ) -> NewsletterResult<Vec<NewsRecord>> {
        let query = match source {
            AnalysisSource::Joined => JOINED_QUERY,
            AnalysisSource::Inline => INLINE_QUERY,
            AnalysisSource::None => RAW_QUERY,
        };

        let rows: Vec<NewsRow> = sqlx::query_as(query)
            .bind(ticker)
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await
            .map_err(store_err)?;

        let with_analysis = source != AnalysisSource::None;
        Ok(rows.into_iter().map(|r| r.into_record(with_analysis)).collect())
    }
}
