//! Notification dispatcher — renders once, then walks a static fallback
//! chain of transport adapters per channel until one delivers.
//!
//! Chains are built once at startup from configuration: the first adapter
//! whose credentials are present is primary, remaining configured adapters
//! are secondary, and a channel with nothing configured gets the demo
//! adapter. A single attempt per adapter per invocation; no retry, no
//! backoff, and failures never propagate to the caller.

use std::sync::Arc;

use chrono::Utc;
use fixhub_core::config::NotifyConfig;
use fixhub_core::traits::{ChannelKind, EmailHistoryStore, OutboundMessage, Transport};
use fixhub_core::types::{EmailHistoryRecord, NotifyChannelPref};
use fixhub_transports::{DemoTransport, MailgunTransport, SmtpTransport, TwilioTransport};

use crate::templates::{self, NotificationKind, RenderContext, RenderedMessage};

/// Who a notification goes to, and through which channels.
#[derive(Debug, Clone, Default)]
pub struct Recipient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: NotifyChannelPref,
}

impl Recipient {
    /// Email-only recipient, the common case.
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn phone(mut self, number: impl Into<String>) -> Self {
        self.phone = Some(number.into());
        self
    }

    pub fn via(mut self, channel: NotifyChannelPref) -> Self {
        self.channel = channel;
        self
    }
}

/// Dispatches rendered notifications through per-channel fallback chains.
pub struct NotificationDispatcher {
    sender: String,
    email_chain: Vec<Box<dyn Transport>>,
    sms_chain: Vec<Box<dyn Transport>>,
    history: Arc<dyn EmailHistoryStore>,
}

impl NotificationDispatcher {
    /// Build the fallback chains from configuration. Called once at startup.
    pub fn from_config(config: &NotifyConfig, history: Arc<dyn EmailHistoryStore>) -> Self {
        let mut email_chain: Vec<Box<dyn Transport>> = Vec::new();
        if let Some(smtp) = &config.smtp {
            if smtp.is_configured() {
                email_chain.push(Box::new(SmtpTransport::new(smtp.clone())));
            }
        }
        if let Some(mailgun) = &config.mailgun {
            if mailgun.is_configured() {
                email_chain.push(Box::new(MailgunTransport::new(mailgun.clone())));
            }
        }
        if email_chain.is_empty() {
            tracing::info!("📭 No email transport configured — using demo adapter");
            email_chain.push(Box::new(DemoTransport::new(ChannelKind::Email)));
        }

        let mut sms_chain: Vec<Box<dyn Transport>> = Vec::new();
        if let Some(twilio) = &config.twilio {
            if twilio.is_configured() {
                sms_chain.push(Box::new(TwilioTransport::new(twilio.clone())));
            }
        }
        if sms_chain.is_empty() {
            tracing::info!("📭 No SMS transport configured — using demo adapter");
            sms_chain.push(Box::new(DemoTransport::new(ChannelKind::Sms)));
        }

        Self {
            sender: config.sender(),
            email_chain,
            sms_chain,
            history,
        }
    }

    /// Assemble from explicit chains. Test seam; also useful for embedders
    /// that bring their own adapters.
    pub fn with_chains(
        sender: impl Into<String>,
        email_chain: Vec<Box<dyn Transport>>,
        sms_chain: Vec<Box<dyn Transport>>,
        history: Arc<dyn EmailHistoryStore>,
    ) -> Self {
        Self {
            sender: sender.into(),
            email_chain,
            sms_chain,
            history,
        }
    }

    /// Adapter names for a channel's chain, primary first.
    pub fn chain_names(&self, channel: ChannelKind) -> Vec<&str> {
        let chain = match channel {
            ChannelKind::Email => &self.email_chain,
            ChannelKind::Sms => &self.sms_chain,
        };
        chain.iter().map(|t| t.name()).collect()
    }

    /// Render once and attempt delivery on every channel the recipient asked
    /// for. Returns true if at least one channel delivered. Never errors:
    /// a `false` return is the only failure signal.
    pub async fn send_notification(
        &self,
        kind: NotificationKind,
        recipient: &Recipient,
        ctx: &RenderContext<'_>,
    ) -> bool {
        let rendered = templates::render(kind, ctx);

        let mut attempts = Vec::new();
        if recipient.channel.wants_email() {
            if let Some(email) = &recipient.email {
                attempts.push(self.attempt(ChannelKind::Email, email.clone(), kind, &rendered, ctx));
            }
        }
        if recipient.channel.wants_sms() {
            if let Some(phone) = &recipient.phone {
                attempts.push(self.attempt(ChannelKind::Sms, phone.clone(), kind, &rendered, ctx));
            }
        }

        if attempts.is_empty() {
            tracing::debug!(
                "No reachable address for {} notification — skipping",
                kind.as_str()
            );
            return false;
        }

        let outcomes = futures::future::join_all(attempts).await;
        outcomes.into_iter().any(|delivered| delivered)
    }

    /// Walk one channel's chain in order; first success stops the walk.
    async fn attempt(
        &self,
        channel: ChannelKind,
        to: String,
        kind: NotificationKind,
        rendered: &RenderedMessage,
        ctx: &RenderContext<'_>,
    ) -> bool {
        let chain = match channel {
            ChannelKind::Email => &self.email_chain,
            ChannelKind::Sms => &self.sms_chain,
        };

        let message = OutboundMessage {
            from: self.sender.clone(),
            to: to.clone(),
            subject: rendered.subject.clone(),
            text: rendered.text.clone(),
            html: match channel {
                ChannelKind::Email => Some(rendered.html.clone()),
                ChannelKind::Sms => None,
            },
        };

        let mut delivered = false;
        for (idx, transport) in chain.iter().enumerate() {
            match transport.send(&message).await {
                Ok(()) => {
                    if idx > 0 {
                        tracing::info!(
                            "🔄 Fallback delivered: {} → {}",
                            chain[0].name(),
                            transport.name()
                        );
                    }
                    delivered = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Transport {} failed for {} notification: {}",
                        transport.name(),
                        kind.as_str(),
                        e
                    );
                }
            }
        }

        if channel == ChannelKind::Email {
            self.record_email(&to, kind, rendered, ctx, delivered).await;
        }

        delivered
    }

    /// Append an email-history row for an attempt, delivered or not. History
    /// failures are logged and swallowed.
    async fn record_email(
        &self,
        to: &str,
        kind: NotificationKind,
        rendered: &RenderedMessage,
        ctx: &RenderContext<'_>,
        delivered: bool,
    ) {
        let (entity_type, entity_id) = ctx.entity_ref();
        let record = EmailHistoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: ctx.business_id.to_string(),
            recipient: to.to_string(),
            subject: rendered.subject.clone(),
            body: rendered.text.clone(),
            kind: kind.as_str().to_string(),
            sender: self.sender.clone(),
            entity_type,
            entity_id,
            delivered,
            created_at: Utc::now(),
        };
        if let Err(e) = self.history.record(record).await {
            tracing::warn!("⚠️ Failed to record email history: {e}");
        }
    }
}
