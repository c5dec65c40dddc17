//! Demo transport — logs the would-be message and reports success.
//!
//! Installed on any channel with no configured adapter so development and
//! first-run setups exercise the full notification path without credentials.

use async_trait::async_trait;
use fixhub_core::error::Result;
use fixhub_core::traits::{ChannelKind, OutboundMessage, Transport};

/// Log-only transport adapter.
pub struct DemoTransport {
    kind: ChannelKind,
}

impl DemoTransport {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Transport for DemoTransport {
    fn name(&self) -> &str {
        match self.kind {
            ChannelKind::Email => "demo-email",
            ChannelKind::Sms => "demo-sms",
        }
    }

    fn channel(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        tracing::info!(
            "📭 [{}] would send to {}: {} — {}",
            self.name(),
            message.to,
            message.subject,
            message.text.lines().next().unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_always_succeeds() {
        let t = DemoTransport::new(ChannelKind::Email);
        let msg = OutboundMessage {
            from: "FixHub <noreply@fixhub.app>".into(),
            to: "customer@example.com".into(),
            subject: "Your repair is booked".into(),
            text: "Hello".into(),
            html: None,
        };
        assert!(t.send(&msg).await.is_ok());
        assert_eq!(t.name(), "demo-email");
        assert_eq!(DemoTransport::new(ChannelKind::Sms).name(), "demo-sms");
    }
}
