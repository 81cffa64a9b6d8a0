use anyhow::{Context, Result};
use async_trait::async_trait;
use newsletter_core::{
    Interest, InterestKind, InterestStore, NewsletterResult, Subscriber, SubscriberStore,
};

use crate::catalog::catalog_table;
use crate::db::{store_err, NewsDb};

fn interest_table(kind: InterestKind) -> &'static str {
    match kind {
        InterestKind::Index => "user_index_interest",
        InterestKind::Stock => "user_stock_interest",
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: String,
    email: String,
    name: Option<String>,
}

impl NewsDb {
    /// Insert a user, or refresh email/name/provider of an existing one.
    pub async fn upsert_user(
        &self,
        id: &str,
        email: &str,
        name: Option<&str>,
        provider: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, provider)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                provider = excluded.provider
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(provider)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Update the newsletter opt-in flag. Returns false when the user is unknown.
    pub async fn set_email_opt_in(&self, user_id: &str, opt_in: bool) -> Result<bool> {
        let flag: i64 = if opt_in { 1 } else { 0 };
        let result = sqlx::query("UPDATE users SET email_opt_in = ? WHERE id = ?")
            .bind(flag)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Follow a ticker. Both the user and the ticker must already exist; the
    /// ticker in the catalog table for `kind`.
    pub async fn add_interest(&self, user_id: &str, ticker: &str, kind: InterestKind) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (user_id, ticker) VALUES (?, ?) ON CONFLICT DO NOTHING",
            interest_table(kind)
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(ticker)
            .execute(self.pool())
            .await
            .with_context(|| {
                format!(
                    "cannot add {} interest {} for user {}: unknown user or ticker not in {}",
                    kind.as_str(),
                    ticker,
                    user_id,
                    catalog_table(kind)
                )
            })?;

        Ok(())
    }

    pub async fn remove_interest(&self, user_id: &str, ticker: &str, kind: InterestKind) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND ticker = ?",
            interest_table(kind)
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(ticker)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    async fn interests_of_kind(&self, user_id: &str, kind: InterestKind) -> sqlx::Result<Vec<Interest>> {
        let sql = format!(
            "SELECT ticker FROM {} WHERE user_id = ? ORDER BY ticker",
            interest_table(kind)
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ticker,)| Interest {
                user_id: user_id.to_string(),
                ticker,
                kind,
            })
            .collect())
    }
}

#[async_trait]
impl InterestStore for NewsDb {
    async fn interests_for(&self, user_id: &str) -> NewsletterResult<Vec<Interest>> {
        let mut interests = self
            .interests_of_kind(user_id, InterestKind::Index)
            .await
            .map_err(store_err)?;
        interests.extend(
            self.interests_of_kind(user_id, InterestKind::Stock)
                .await
                .map_err(store_err)?,
        );
        Ok(interests)
    }
}

#[async_trait]
impl SubscriberStore for NewsDb {
    async fn opted_in_subscribers(&self) -> NewsletterResult<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            "SELECT id, email, name FROM users WHERE email_opt_in = 1 ORDER BY id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(store_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Subscriber {
                id: r.id,
                email: r.email,
                name: r.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TickerCatalogEntry;

    fn entries(tickers: &[&str]) -> Vec<TickerCatalogEntry> {
        tickers
            .iter()
            .map(|t| TickerCatalogEntry {
                ticker: t.to_string(),
                name: t.to_string(),
                query: String::new(),
            })
            .collect()
    }

    async fn setup() -> NewsDb {
        let db = NewsDb::connect("sqlite::memory:").await.unwrap();
        db.seed_catalog(InterestKind::Index, &entries(&["^KS11"])).await.unwrap();
        db.seed_catalog(InterestKind::Stock, &entries(&["AAPL", "TSLA"])).await.unwrap();
        db.upsert_user("u1", "kim@example.com", Some("Kim"), Some("google"))
            .await
            .unwrap();
        db.upsert_user("u2", "lee@example.com", None, Some("local"))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_interests_cover_both_relations() {
        let db = setup().await;
        db.add_interest("u1", "^KS11", InterestKind::Index).await.unwrap();
        db.add_interest("u1", "AAPL", InterestKind::Stock).await.unwrap();
        db.add_interest("u1", "AAPL", InterestKind::Stock).await.unwrap();
        db.add_interest("u2", "TSLA", InterestKind::Stock).await.unwrap();

        let interests = db.interests_for("u1").await.unwrap();
        assert_eq!(interests.len(), 2);
        assert_eq!(interests[0].ticker, "^KS11");
        assert_eq!(interests[0].kind, InterestKind::Index);
        assert_eq!(interests[1].ticker, "AAPL");
        assert_eq!(interests[1].kind, InterestKind::Stock);

        db.remove_interest("u1", "AAPL", InterestKind::Stock).await.unwrap();
        assert_eq!(db.interests_for("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_interest_requires_catalog_ticker() {
        let db = setup().await;
        let err = db
            .add_interest("u1", "NVDA", InterestKind::Stock)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stock_batmmaan"));

        // index and stock catalogs are separate
        assert!(db.add_interest("u1", "AAPL", InterestKind::Index).await.is_err());
        assert!(db.add_interest("ghost", "AAPL", InterestKind::Stock).await.is_err());
        assert!(db.interests_for("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_interests() {
        let db = setup().await;
        assert!(db.interests_for("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opted_in_subscribers() {
        let db = setup().await;
        assert!(db.opted_in_subscribers().await.unwrap().is_empty());

        assert!(db.set_email_opt_in("u2", true).await.unwrap());
        assert!(db.set_email_opt_in("u1", true).await.unwrap());
        assert!(!db.set_email_opt_in("ghost", true).await.unwrap());

        let subs = db.opted_in_subscribers().await.unwrap();
        let ids: Vec<_> = subs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert_eq!(subs[0].name.as_deref(), Some("Kim"));
        assert_eq!(subs[1].name, None);

        db.set_email_opt_in("u1", false).await.unwrap();
        assert_eq!(db.opted_in_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_user_updates_existing() {
        let db = setup().await;
        db.set_email_opt_in("u1", true).await.unwrap();
        db.upsert_user("u1", "kim@new.example.com", Some("Kim J"), Some("google"))
            .await
            .unwrap();

        let subs = db.opted_in_subscribers().await.unwrap();
        assert_eq!(subs[0].email, "kim@new.example.com");
        assert_eq!(subs[0].name.as_deref(), Some("Kim J"));
    }
}
