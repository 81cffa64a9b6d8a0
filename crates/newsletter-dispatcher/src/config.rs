use anyhow::{anyhow, bail, Result};
use newsletter_core::SelectionPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How candidate items are collected per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Articles joined with the precomputed analysis table (default)
    Join,
    /// Analysis stored on the article row
    SingleTable,
    /// Summarized on demand by the LLM service
    Remote,
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join" | "precomputed" => Ok(StrategyKind::Join),
            "single" | "single-table" | "inline" => Ok(StrategyKind::SingleTable),
            "remote" | "llm" => Ok(StrategyKind::Remote),
            other => bail!("unknown COLLECTION_STRATEGY '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub database_url: String,
    pub strategy: StrategyKind,
    pub llm_server_url: Option<String>,
    pub summarizer_timeout: Duration,
    pub articles_per_ticker: usize,
    pub policy: SelectionPolicy,
    pub dispatch_interval: Duration,
    pub run_once: bool,
    pub ticker_catalog_dir: Option<PathBuf>,
}

fn parse_or<T>(vars: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SelectionPolicy::default();

        let config = Self {
            database_url: vars("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:newsletter.db?mode=rwc".to_string()),
            strategy: parse_or(&vars, "COLLECTION_STRATEGY", StrategyKind::Join)?,
            llm_server_url: vars("LLM_SERVER_URL").filter(|v| !v.trim().is_empty()),
            summarizer_timeout: Duration::from_secs(parse_or(
                &vars,
                "SUMMARIZER_TIMEOUT_SECS",
                newsletter_core::SUMMARIZER_TIMEOUT_SECS,
            )?),
            articles_per_ticker: parse_or(
                &vars,
                "ARTICLES_PER_TICKER",
                newsletter_core::ARTICLES_PER_TICKER,
            )?,
            policy: SelectionPolicy {
                min_len: parse_or(&vars, "SUMMARY_MIN_LEN", defaults.min_len)?,
                max_len: parse_or(&vars, "SUMMARY_MAX_LEN", defaults.max_len)?,
                max_count: parse_or(&vars, "SUMMARY_MAX_COUNT", defaults.max_count)?,
            },
            dispatch_interval: Duration::from_secs(parse_or(
                &vars,
                "DISPATCH_INTERVAL_SECS",
                60 * 60 * 24,
            )?),
            run_once: parse_or(&vars, "RUN_ONCE", false)?,
            ticker_catalog_dir: vars("TICKER_CATALOG_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        if self.articles_per_ticker == 0 {
            bail!("ARTICLES_PER_TICKER must be at least 1");
        }
        if self.summarizer_timeout.is_zero() {
            bail!("SUMMARIZER_TIMEOUT_SECS must be at least 1");
        }
        if self.dispatch_interval.is_zero() {
            bail!("DISPATCH_INTERVAL_SECS must be at least 1");
        }
        if self.strategy == StrategyKind::Remote && self.llm_server_url.is_none() {
            bail!("LLM_SERVER_URL is required when COLLECTION_STRATEGY=remote");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<DispatcherConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DispatcherConfig::from_vars(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from(&[]).unwrap();
        assert_eq!(config.strategy, StrategyKind::Join);
        assert_eq!(config.policy, SelectionPolicy::default());
        assert_eq!(config.articles_per_ticker, 10);
        assert_eq!(config.summarizer_timeout, Duration::from_secs(10));
        assert_eq!(config.dispatch_interval, Duration::from_secs(86_400));
        assert!(!config.run_once);
        assert!(config.ticker_catalog_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from(&[
            ("COLLECTION_STRATEGY", "remote"),
            ("LLM_SERVER_URL", "http://llm:8000"),
            ("SUMMARY_MIN_LEN", "100"),
            ("SUMMARY_MAX_COUNT", "3"),
            ("RUN_ONCE", "true"),
        ])
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::Remote);
        assert_eq!(config.policy.min_len, 100);
        assert_eq!(config.policy.max_len, 400);
        assert_eq!(config.policy.max_count, 3);
        assert!(config.run_once);
    }

    #[test]
    fn test_remote_requires_llm_url() {
        assert!(from(&[("COLLECTION_STRATEGY", "remote")]).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(from(&[("SUMMARY_MAX_LEN", "lots")]).is_err());
        assert!(from(&[("SUMMARY_MIN_LEN", "500")]).is_err());
        assert!(from(&[("COLLECTION_STRATEGY", "carrier-pigeon")]).is_err());
        assert!(from(&[("ARTICLES_PER_TICKER", "0")]).is_err());
    }

    #[test]
    fn test_strategy_aliases() {
        assert_eq!("single-table".parse::<StrategyKind>().unwrap(), StrategyKind::SingleTable);
        assert_eq!(" JOIN ".parse::<StrategyKind>().unwrap(), StrategyKind::Join);
    }
}
