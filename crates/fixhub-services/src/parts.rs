//! Single-part procurement lifecycle — simpler than orders, with an
//! append-only status history feed per part.

use std::sync::Arc;

use serde_json::json;

use fixhub_audit::ActivityLogger;
use fixhub_core::clock::Clock;
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{Directory, PartStore};
use fixhub_core::types::{NewPart, PartOnOrder, PartOrderUpdate, PartStatus};
use fixhub_notify::{NotificationDispatcher, NotificationKind, Recipient, RenderContext};

use crate::jobs::JobService;

/// Part-on-order lifecycle coordinator.
pub struct PartService {
    parts: Arc<dyn PartStore>,
    directory: Arc<dyn Directory>,
    dispatcher: Arc<NotificationDispatcher>,
    activity: ActivityLogger,
    jobs: Arc<JobService>,
    clock: Arc<dyn Clock>,
}

impl PartService {
    pub fn new(
        parts: Arc<dyn PartStore>,
        directory: Arc<dyn Directory>,
        dispatcher: Arc<NotificationDispatcher>,
        activity: ActivityLogger,
        jobs: Arc<JobService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            parts,
            directory,
            dispatcher,
            activity,
            jobs,
            clock,
        }
    }

    /// Create a part record in `Ordered` state with its first feed row.
    pub async fn create(
        &self,
        business_id: &str,
        new: NewPart,
        actor_id: Option<i64>,
    ) -> Result<PartOnOrder> {
        let now = self.clock.now();
        let part = PartOnOrder {
            id: 0,
            business_id: business_id.to_string(),
            name: new.name,
            status: PartStatus::Ordered,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            notify: new.notify,
            job_id: new.job_id,
            created_at: now,
            updated_at: now,
        };
        let part = self.parts.create(part).await?;
        tracing::info!("🔩 Part '{}' ordered for {business_id}", part.name);

        if let Err(e) = self
            .parts
            .add_update(PartOrderUpdate {
                id: 0,
                part_id: part.id,
                status: PartStatus::Ordered,
                note: "Part ordered".into(),
                created_at: now,
            })
            .await
        {
            tracing::warn!("⚠️ Feed row for part {} failed: {e}", part.id);
        }

        self.activity
            .log(
                business_id,
                actor_id,
                "part_created",
                "part",
                &part.id.to_string(),
                json!({"name": part.name}),
            )
            .await;

        self.touch_linked_job(&part).await;
        Ok(part)
    }

    /// Move a part to `status`, appending one feed row per actual change.
    /// Arrival notifies the customer when the part's `notify` flag is set.
    pub async fn set_status(
        &self,
        business_id: &str,
        id: i64,
        status: PartStatus,
        note: Option<&str>,
        actor_id: Option<i64>,
    ) -> Result<PartOnOrder> {
        let prior = self
            .parts
            .find_by_id(business_id, id)
            .await?
            .ok_or_else(|| FixHubError::not_found("part", id))?;

        let mut part = prior.clone();
        part.status = status;
        part.updated_at = self.clock.now();
        let part = self.parts.update(&part).await?;

        if prior.status == status {
            return Ok(part);
        }

        if let Err(e) = self
            .parts
            .add_update(PartOrderUpdate {
                id: 0,
                part_id: part.id,
                status,
                note: note
                    .map(String::from)
                    .unwrap_or_else(|| format!("Status changed to {}", status.label())),
                created_at: part.updated_at,
            })
            .await
        {
            tracing::warn!("⚠️ Feed row for part {} failed: {e}", part.id);
        }

        self.activity
            .log(
                business_id,
                actor_id,
                "part_status_changed",
                "part",
                &part.id.to_string(),
                json!({
                    "name": part.name,
                    "from": prior.status.label(),
                    "to": status.label(),
                }),
            )
            .await;

        if status == PartStatus::Arrived
            && part.notify
            && (part.customer_email.is_some() || part.customer_phone.is_some())
        {
            let delivered = self.notify_arrival(&part).await;
            if !delivered {
                tracing::warn!("⚠️ Arrival notification for part {} not delivered", part.id);
            }
        }

        self.touch_linked_job(&part).await;
        Ok(part)
    }

    /// The part's status history feed, oldest first.
    pub async fn history(&self, business_id: &str, id: i64) -> Result<Vec<PartOrderUpdate>> {
        self.parts
            .find_by_id(business_id, id)
            .await?
            .ok_or_else(|| FixHubError::not_found("part", id))?;
        self.parts.updates(id).await
    }

    /// Delete a part and its feed.
    pub async fn delete(
        &self,
        business_id: &str,
        id: i64,
        actor_id: Option<i64>,
    ) -> Result<bool> {
        let prior = match self.parts.find_by_id(business_id, id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("⚠️ Pre-delete fetch of part {id} failed: {e}");
                None
            }
        };

        let found = self.parts.delete(business_id, id).await?;
        if found {
            let name = prior.map(|p| p.name).unwrap_or_else(|| id.to_string());
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "part_deleted",
                    "part",
                    &id.to_string(),
                    json!({"name": name}),
                )
                .await;
        }
        Ok(found)
    }

    async fn notify_arrival(&self, part: &PartOnOrder) -> bool {
        let business_name = match self.directory.get_business(&part.business_id).await {
            Ok(Some(business)) => business.name,
            Ok(None) => part.business_id.clone(),
            Err(e) => {
                tracing::warn!("⚠️ Business lookup for {} failed: {e}", part.business_id);
                part.business_id.clone()
            }
        };
        let ctx = RenderContext::new(&part.business_id, &business_name)
            .recipient(Some(part.customer_name.as_str()))
            .part(part);
        let recipient = Recipient {
            name: Some(part.customer_name.clone()),
            email: part.customer_email.clone(),
            phone: part.customer_phone.clone(),
            channel: Default::default(),
        };
        self.dispatcher
            .send_notification(NotificationKind::PartReady, &recipient, &ctx)
            .await
    }

    async fn touch_linked_job(&self, part: &PartOnOrder) {
        if let Some(job_id) = part.job_id {
            if let Err(e) = self.jobs.touch(&part.business_id, job_id).await {
                tracing::warn!("⚠️ Touch of job {job_id} linked to part {} failed: {e}", part.id);
            }
        }
    }
}
