//! Outbound email over async SMTP.

use anyhow::Context;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use crate::config::Config;
use crate::errors::AppError;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();
        let from = config
            .email_from
            .parse()
            .context("invalid EMAIL_FROM address")?;

        Ok(Self { transport, from })
    }

    /// Sends a plain-text newsletter to a single recipient.
    pub async fn send_newsletter(
        &self,
        to_email: &str,
        to_name: &str,
        content: &str,
    ) -> Result<(), AppError> {
        let to: Mailbox = format!("{to_name} <{to_email}>")
            .parse()
            .map_err(|e| AppError::Email(format!("invalid recipient address: {e}")))?;

        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your CreatorPulse Newsletter")
            .header(header::ContentType::TEXT_PLAIN)
            .body(content.to_string())
            .map_err(|e| AppError::Email(format!("failed to build message: {e}")))?;

        self.transport
            .send(msg)
            .await
            .map_err(|e| AppError::Email(format!("smtp send failed: {e}")))?;

        Ok(())
    }
}
