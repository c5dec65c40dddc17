//! Mailgun email transport — HTTP API sending.
//!
//! Secondary email adapter for deployments without SMTP access.

use async_trait::async_trait;
use fixhub_core::config::MailgunConfig;
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{ChannelKind, OutboundMessage, Transport};

/// Mailgun transport adapter.
pub struct MailgunTransport {
    config: MailgunConfig,
    client: reqwest::Client,
}

impl MailgunTransport {
    pub fn new(config: MailgunConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for MailgunTransport {
    fn name(&self) -> &str {
        "mailgun"
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let url = format!(
            "{}/v3/{}/messages",
            self.config.base_url, self.config.domain
        );

        let mut form = vec![
            ("from", message.from.clone()),
            ("to", message.to.clone()),
            ("subject", message.subject.clone()),
            ("text", message.text.clone()),
        ];
        if let Some(html) = &message.html {
            form.push(("html", html.clone()));
        }

        let resp = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| FixHubError::Transport(format!("Mailgun send: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("📤 Email sent via Mailgun to {}", message.to);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(FixHubError::Transport(format!(
                "Mailgun API error {status}: {body}"
            )))
        }
    }
}
