use newsletter_core::NewsletterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Gateway timeout")]
    GatewayTimeout,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,
}

pub type SummarizerResult<T> = Result<T, SummarizerError>;

impl From<SummarizerError> for NewsletterError {
    fn from(e: SummarizerError) -> Self {
        match e {
            SummarizerError::GatewayTimeout => NewsletterError::GatewayTimeout,
            SummarizerError::InvalidResponse(msg) => NewsletterError::InvalidResponse(msg),
            other => NewsletterError::Summarizer(other.to_string()),
        }
    }
}
