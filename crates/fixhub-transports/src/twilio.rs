//! Twilio SMS transport.
//!
//! The sole SMS gateway adapter. Only the plain-text body travels; subject
//! and HTML are email concerns.

use async_trait::async_trait;
use fixhub_core::config::TwilioConfig;
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{ChannelKind, OutboundMessage, Transport};

/// Twilio SMS transport adapter.
pub struct TwilioTransport {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioTransport {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for TwilioTransport {
    fn name(&self) -> &str {
        "twilio"
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let form = [
            ("To", message.to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", message.text.as_str()),
        ];

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| FixHubError::Transport(format!("Twilio send: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("📤 SMS sent via Twilio to {}", message.to);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(FixHubError::Transport(format!(
                "Twilio API error {status}: {body}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_channel() {
        let t = TwilioTransport::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "tok".into(),
            from_number: "+15550100".into(),
        });
        assert_eq!(t.name(), "twilio");
        assert_eq!(t.channel(), ChannelKind::Sms);
    }
}
