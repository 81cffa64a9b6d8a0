use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Summarizer gateway timeout")]
    GatewayTimeout,

    #[error("Summarizer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid summarizer response: {0}")]
    InvalidResponse(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NewsletterError {
    /// Transient errors are scoped to a single ticker: the collector logs them
    /// and moves on. Everything else aborts the current user's run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NewsletterError::Summarizer(_)
                | NewsletterError::GatewayTimeout
                | NewsletterError::Timeout(_)
                | NewsletterError::InvalidResponse(_)
        )
    }
}

pub type NewsletterResult<T> = Result<T, NewsletterError>;
