use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use crate::config::EmailConfig;
use crate::error::{PackratError, Result};

/// Fixed subject line for every status message.
pub const SUBJECT: &str = "Backup status";

/// Seam for status delivery, so orchestration is testable without a mail
/// server. One message per call; no batching, no retry.
pub trait Notifier {
    fn notify(&self, body: &str) -> Result<()>;
}

/// Sends plain-text status mail over an authenticated submission channel.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, body: &str) -> Result<()> {
        if !self.config.enabled {
            debug!("email delivery disabled, dropping status message");
            return Ok(());
        }

        let delivery = |message: String| PackratError::Delivery(message);

        let message = Message::builder()
            .from(self.config.username.parse().map_err(|e| {
                delivery(format!(
                    "invalid sender address '{}': {e}",
                    self.config.username
                ))
            })?)
            .to(self.config.recipient.parse().map_err(|e| {
                delivery(format!(
                    "invalid recipient address '{}': {e}",
                    self.config.recipient
                ))
            })?)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| delivery(format!("cannot build message: {e}")))?;

        let transport = SmtpTransport::starttls_relay(&self.config.smtp_host)
            .map_err(|e| delivery(format!("smtp setup failed: {e}")))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        transport
            .send(&message)
            .map_err(|e| delivery(e.to_string()))?;

        info!(recipient = %self.config.recipient, "status email sent");
        Ok(())
    }
}
