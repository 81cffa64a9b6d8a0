use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use newsletter_core::{CandidateItem, DigestDelivery, NewsletterResult, Subscriber};

use crate::templates::DigestTemplate;
use crate::{MailerConfig, MailerError, SmtpTls};

/// Sends digests over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    template: DigestTemplate,
}

fn sender_mailbox(config: &MailerConfig) -> Result<Mailbox, MailerError> {
    let from_addr = config
        .from_address
        .as_deref()
        .ok_or_else(|| MailerError::Config("MAIL_FROM not set".into()))?;
    let address: Address = from_addr
        .parse()
        .map_err(|e| MailerError::Config(format!("Invalid from address: {}", e)))?;
    Ok(Mailbox::new(config.from_name.clone(), address))
}

impl SmtpMailer {
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| MailerError::Config("MAIL_SERVER not set".into()))?;
        let from = sender_mailbox(config)?;

        let mut builder = match config.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                host,
            )),
        }
        .map_err(|e| MailerError::Smtp(format!("SMTP transport error: {}", e)))?;

        builder = builder.port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            template: config.template(),
        })
    }

    /// Build the digest message for one subscriber.
    pub fn build_message(
        &self,
        subscriber: &Subscriber,
        items: &[CandidateItem],
        date: chrono::NaiveDate,
    ) -> Result<Message, MailerError> {
        build_digest_message(&self.from, &self.template, subscriber, items, date)
    }

    /// Verify the SMTP connection.
    pub async fn test_connection(&self) -> Result<bool, MailerError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| MailerError::Smtp(format!("Connection test failed: {}", e)))
    }
}

fn build_digest_message(
    from: &Mailbox,
    template: &DigestTemplate,
    subscriber: &Subscriber,
    items: &[CandidateItem],
    date: chrono::NaiveDate,
) -> Result<Message, MailerError> {
    let to: Mailbox = subscriber
        .email
        .parse()
        .map_err(|e| MailerError::Config(format!("Invalid recipient {}: {}", subscriber.email, e)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(template.subject(date))
        .header(ContentType::TEXT_HTML)
        .body(template.render(subscriber.display_name(), items, date))
        .map_err(|e| MailerError::Smtp(format!("Failed to build email: {}", e)))
}

#[async_trait]
impl DigestDelivery for SmtpMailer {
    async fn deliver(&self, subscriber: &Subscriber, items: &[CandidateItem]) -> NewsletterResult<()> {
        let email = self.build_message(subscriber, items, chrono::Local::now().date_naive())?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailerError::Smtp(format!("Failed to send email: {}", e)))?;

        tracing::info!("Newsletter sent to {}", subscriber.email);
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
