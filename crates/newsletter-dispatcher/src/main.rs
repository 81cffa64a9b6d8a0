use std::sync::Arc;

use anyhow::Result;
use digest_mailer::{MailerConfig, SmtpMailer};
use newsletter_core::DigestDelivery;
use newsletter_dispatcher::{run_cycle, DispatcherConfig, LogOnlyDelivery, StrategyKind};
use summarizer_client::{SummarizerClient, SummarizerConfig};
use tokio::signal::unix::SignalKind;
use tokio::time;

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// SMTP when a server and sender are configured, otherwise a dry run.
async fn build_delivery() -> Arc<dyn DigestDelivery> {
    let mail_config = MailerConfig::from_env();
    if !mail_config.is_configured() {
        tracing::warn!("MAIL_SERVER/MAIL_FROM not set, digests will only be logged");
        return Arc::new(LogOnlyDelivery);
    }

    let mailer = match SmtpMailer::new(&mail_config) {
        Ok(mailer) => mailer,
        Err(e) => {
            tracing::warn!("SMTP not available ({}), digests will only be logged", e);
            return Arc::new(LogOnlyDelivery);
        }
    };

    let host = mail_config.smtp_host.as_deref().unwrap_or_default();
    match mailer.test_connection().await {
        Ok(true) => tracing::info!("SMTP delivery via {}:{}", host, mail_config.smtp_port),
        Ok(false) => tracing::warn!("SMTP server {} did not accept the connection check", host),
        Err(e) => tracing::warn!("SMTP connection check failed: {}", e),
    }
    Arc::new(mailer)
}

/// Startup health check of the summarization service. Failures are only logged;
/// each cycle retries per ticker.
async fn check_summarizer(config: &DispatcherConfig) {
    let Some(url) = &config.llm_server_url else {
        return;
    };
    let client = match SummarizerClient::new(
        SummarizerConfig::new(url.clone()).with_timeout(config.summarizer_timeout),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Summarizer client init failed: {}", e);
            return;
        }
    };
    match client.health().await {
        Ok(true) => tracing::info!("Summarizer healthy ({})", client.base_url()),
        Ok(false) => tracing::warn!("Summarizer at {} reports unhealthy", client.base_url()),
        Err(e) => tracing::warn!("Summarizer at {} unreachable: {}", client.base_url(), e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting newsletter dispatcher");

    let config = DispatcherConfig::from_env()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Collection strategy: {:?}", config.strategy);
    tracing::info!("  Articles per ticker: {}", config.articles_per_ticker);
    tracing::info!(
        "  Summary length: {}..={} chars, up to {} items",
        config.policy.min_len,
        config.policy.max_len,
        config.policy.max_count
    );
    if let Some(url) = &config.llm_server_url {
        tracing::info!(
            "  Summarizer: {} (timeout {}s)",
            url,
            config.summarizer_timeout.as_secs()
        );
    }
    tracing::info!(
        "  Dispatch interval: {} seconds{}",
        config.dispatch_interval.as_secs(),
        if config.run_once { " (single run)" } else { "" }
    );

    if config.strategy == StrategyKind::Remote {
        check_summarizer(&config).await;
    }
    let delivery = build_delivery().await;

    let mut interval = time::interval(config.dispatch_interval);
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    };
    tokio::pin!(shutdown);

    let mut cycles: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycles += 1;
                match run_cycle(&config, delivery.clone()).await {
                    Ok(report) => tracing::info!(
                        "Cycle #{}: {} sent, {} skipped, {} failed",
                        cycles,
                        report.sent,
                        report.skipped,
                        report.failed
                    ),
                    Err(e) => tracing::error!("Error in dispatch cycle #{}: {:#}", cycles, e),
                }

                if config.run_once {
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, exiting gracefully...");
                break;
            }
        }
    }

    tracing::info!("Newsletter dispatcher shut down.");
    Ok(())
}
