use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::Settings;

/// Async SMTP notifier. Delivery failures are logged and swallowed; a lost
/// notification must never fail the request that triggered it.
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_email: String,
}

impl Mailer {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        if !settings.smtp.enabled {
            info!("SMTP disabled, outgoing email will be dropped");
            return Ok(Self::disabled());
        }

        let credentials = Credentials::new(
            settings.smtp.from_email.clone(),
            settings.smtp.password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp.relay)?
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Some(transport),
            from_email: settings.smtp.from_email.clone(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_email: String::new(),
        }
    }

    /// Sends an HTML email. Returns whether the message was handed to the
    /// relay, for the metrics recorder.
    pub async fn send(&self, to: &str, subject: &str, html_body: String) -> bool {
        let transport = match &self.transport {
            Some(transport) => transport,
            None => {
                info!("SMTP disabled, dropping email to {}", to);
                return false;
            }
        };

        let from: Mailbox = match self.from_email.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                error!("Invalid sender address {}: {:?}", self.from_email, e);
                return false;
            }
        };
        let to_mailbox: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                error!("Invalid recipient address {}: {:?}", to, e);
                return false;
            }
        };

        let message = match Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
        {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to build email to {}: {:?}", to, e);
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                info!("Email sent to {}", to);
                true
            }
            Err(e) => {
                error!("Email failed to send: {:?}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_mailer_drops_without_error() {
        let mailer = Mailer::disabled();
        assert!(
            !mailer
                .send("doctor@example.com", "Subject", "<p>body</p>".to_string())
                .await
        );
    }
}
