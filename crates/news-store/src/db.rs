use anyhow::{Context, Result};
use newsletter_core::NewsletterError;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

/// Connection pool over the newsletter database.
///
/// A pool is opened for one dispatch cycle and closed when the cycle ends;
/// nothing keeps a handle alive between cycles.
#[derive(Clone)]
pub struct NewsDb {
    pool: AnyPool,
}

impl NewsDb {
    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        // Every connection to an in-memory SQLite database sees its own copy.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to connect to {}", redact(database_url)))?;

        let db = Self { pool };
        db.init_schema().await?;

        Ok(db)
    }

    /// Create missing tables.
    pub async fn init_schema(&self) -> Result<()> {
        let schema = include_str!("schema.sql");

        // sqlx runs one statement per query
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("schema statement failed: {}", stmt))?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Store failures are systemic for the run that hit them.
pub(crate) fn store_err(e: sqlx::Error) -> NewsletterError {
    NewsletterError::Store(e.to_string())
}

/// Strip credentials from a database URL before logging it.
fn redact(database_url: &str) -> String {
    match (database_url.find("://"), database_url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &database_url[..scheme_end], &database_url[at..])
        }
        _ => database_url.to_string(),
    }
}
