mod smtp;
mod templates;

pub use smtp::SmtpMailer;
pub use templates::DigestTemplate;

/// Errors from digest delivery.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<MailerError> for newsletter_core::NewsletterError {
    fn from(e: MailerError) -> Self {
        newsletter_core::NewsletterError::Delivery(e.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        }
    }
}

/// SMTP settings and newsletter branding.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub smtp_tls: SmtpTls,
    pub brand: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            from_name: None,
            smtp_tls: SmtpTls::default(),
            brand: "FinanceFlow".to_string(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl MailerConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            smtp_host: non_empty_env("MAIL_SERVER"),
            smtp_port: std::env::var("MAIL_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.smtp_port),
            smtp_username: non_empty_env("MAIL_USERNAME"),
            smtp_password: non_empty_env("MAIL_PASSWORD"),
            from_address: non_empty_env("MAIL_FROM"),
            from_name: non_empty_env("MAIL_FROM_NAME"),
            smtp_tls: SmtpTls::parse(&std::env::var("MAIL_TLS").unwrap_or_default()),
            brand: non_empty_env("NEWSLETTER_BRAND").unwrap_or(defaults.brand),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some()
    }

    pub fn template(&self) -> DigestTemplate {
        DigestTemplate::new(self.brand.clone(), self.from_address.clone())
    }
}
