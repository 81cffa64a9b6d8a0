//! Ticker catalog seeding from `stock_index.json` / `stock_BATMMAAN.json`.

use std::path::Path;

use anyhow::{Context, Result};
use newsletter_core::InterestKind;
use serde::{Deserialize, Serialize};

use crate::db::NewsDb;

pub const INDEX_CATALOG_FILE: &str = "stock_index.json";
pub const STOCK_CATALOG_FILE: &str = "stock_BATMMAAN.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerCatalogEntry {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default)]
    pub query: String,
}

/// Read a catalog file. A missing file is an empty catalog.
pub fn load_catalog_file(path: &Path) -> Result<Vec<TickerCatalogEntry>> {
    if !path.exists() {
        tracing::debug!("Catalog file {} not found, skipping", path.display());
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid catalog {}", path.display()))
}

pub(crate) fn catalog_table(kind: InterestKind) -> &'static str {
    match kind {
        InterestKind::Index => "stock_index",
        InterestKind::Stock => "stock_batmmaan",
    }
}

impl NewsDb {
    /// Insert catalog entries whose ticker is not known yet. Returns the number
    /// of rows inserted; existing rows are left as they are.
    pub async fn seed_catalog(&self, kind: InterestKind, entries: &[TickerCatalogEntry]) -> Result<u64> {
        let table = catalog_table(kind);
        let sql = format!(
            "INSERT INTO {table} (ticker, name, query) \
             SELECT ?, ?, ? WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE ticker = ?)"
        );

        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(&sql)
                .bind(&entry.ticker)
                .bind(&entry.name)
                .bind(&entry.query)
                .bind(&entry.ticker)
                .execute(self.pool())
                .await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Seed both catalogs from the JSON files in `dir`.
    pub async fn seed_catalog_dir(&self, dir: &Path) -> Result<u64> {
        let index = load_catalog_file(&dir.join(INDEX_CATALOG_FILE))?;
        let stocks = load_catalog_file(&dir.join(STOCK_CATALOG_FILE))?;

        let inserted = self.seed_catalog(InterestKind::Index, &index).await?
            + self.seed_catalog(InterestKind::Stock, &stocks).await?;
        tracing::info!(
            "Ticker catalog seeded from {}: {} new of {} entries",
            dir.display(),
            inserted,
            index.len() + stocks.len()
        );
        Ok(inserted)
    }

    pub async fn catalog(&self, kind: InterestKind) -> Result<Vec<TickerCatalogEntry>> {
        let sql = format!(
            "SELECT ticker, name, query FROM {} ORDER BY ticker",
            catalog_table(kind)
        );
        let rows: Vec<(String, Option<String>, Option<String>)> =
            sqlx::query_as(&sql).fetch_all(self.pool()).await?;

        Ok(rows
            .into_iter()
            .map(|(ticker, name, query)| TickerCatalogEntry {
                ticker,
                name: name.unwrap_or_default(),
                query: query.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ticker: &str, name: &str) -> TickerCatalogEntry {
        TickerCatalogEntry {
            ticker: ticker.into(),
            name: name.into(),
            query: String::new(),
        }
    }

    #[test]
    fn test_parses_catalog_json() {
        let json = r#"[{"Ticker":"^KS11","Name":"KOSPI","query":"코스피"},{"Ticker":"^DJI","Name":"Dow Jones"}]"#;
        let entries: Vec<TickerCatalogEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "코스피");
        assert_eq!(entries[1].query, "");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let entries = load_catalog_file(Path::new("/definitely/not/here.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_seed_skips_existing_tickers() {
        let db = NewsDb::connect("sqlite::memory:").await.unwrap();
        let first = db
            .seed_catalog(InterestKind::Stock, &[entry("AAPL", "Apple"), entry("MSFT", "Microsoft")])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let second = db
            .seed_catalog(InterestKind::Stock, &[entry("AAPL", "Renamed"), entry("NVDA", "Nvidia")])
            .await
            .unwrap();
        assert_eq!(second, 1);

        let catalog = db.catalog(InterestKind::Stock).await.unwrap();
        let names: Vec<_> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Microsoft", "Nvidia"]);
        assert!(db.catalog(InterestKind::Index).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_catalog_dir() {
        let dir = std::env::temp_dir().join(format!("news-store-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(INDEX_CATALOG_FILE),
            r#"[{"Ticker":"^GSPC","Name":"S&P 500","query":"S&P 500"}]"#,
        )
        .unwrap();

        let db = NewsDb::connect("sqlite::memory:").await.unwrap();
        assert_eq!(db.seed_catalog_dir(&dir).await.unwrap(), 1);
        assert_eq!(db.catalog(InterestKind::Index).await.unwrap()[0].ticker, "^GSPC");

        std::fs::remove_dir_all(&dir).ok();
    }
}
