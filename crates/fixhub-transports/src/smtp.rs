//! SMTP email transport — async sending via lettre.
//!
//! The usual primary email adapter: any STARTTLS relay (Gmail, Outlook,
//! custom servers) reachable with username/password credentials.

use async_trait::async_trait;
use fixhub_core::config::SmtpConfig;
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{ChannelKind, OutboundMessage, Transport};

/// SMTP transport adapter.
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor,
            message::{Mailbox, MultiPart, header::ContentType},
            transport::smtp::authentication::Credentials,
        };

        let from_mailbox: Mailbox = message
            .from
            .parse()
            .map_err(|e| FixHubError::Transport(format!("Invalid from: {e}")))?;
        let to_mailbox: Mailbox = message
            .to
            .parse()
            .map_err(|e| FixHubError::Transport(format!("Invalid to: {e}")))?;

        let builder = LettreMessage::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(message.subject.clone());

        let email = match &message.html {
            Some(html) => builder
                .multipart(MultiPart::alternative_plain_html(
                    message.text.clone(),
                    html.clone(),
                ))
                .map_err(|e| FixHubError::Transport(format!("Build email: {e}")))?,
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text.clone())
                .map_err(|e| FixHubError::Transport(format!("Build email: {e}")))?,
        };

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| FixHubError::Transport(format!("SMTP relay: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| FixHubError::Transport(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent via SMTP to {}", message.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "workshop@example.com".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_name_and_channel() {
        let t = SmtpTransport::new(config());
        assert_eq!(t.name(), "smtp");
        assert_eq!(t.channel(), ChannelKind::Email);
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected_before_connect() {
        let t = SmtpTransport::new(config());
        let msg = OutboundMessage {
            from: "FixHub <noreply@fixhub.app>".into(),
            to: "not-an-address".into(),
            subject: "Hello".into(),
            text: "body".into(),
            html: None,
        };
        let err = t.send(&msg).await.unwrap_err();
        assert!(err.to_string().contains("Invalid to"));
    }
}
