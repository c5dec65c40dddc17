//! Job lifecycle coordinator.
//!
//! Orchestrates: persist mutation → classify with the change detector → run
//! notification and audit side effects, each isolated. The persisted entity
//! is returned to the caller whatever the side effects did.

use std::sync::Arc;

use serde_json::json;

use fixhub_audit::ActivityLogger;
use fixhub_core::clock::Clock;
use fixhub_core::error::{FixHubError, Result, SideEffectError};
use fixhub_core::traits::{Directory, JobStore, JobUpdateStore};
use fixhub_core::types::{Job, JobPatch, JobStatus, JobUpdate, NewJob};
use fixhub_notify::{NotificationDispatcher, NotificationKind, Recipient, RenderContext};

use crate::changes;

/// Resolved customer contact for a job: a referenced customer record wins,
/// free-text fields on the job are the fallback.
#[derive(Debug, Clone, Default)]
struct Contact {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

/// Job lifecycle coordinator.
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    updates: Arc<dyn JobUpdateStore>,
    directory: Arc<dyn Directory>,
    dispatcher: Arc<NotificationDispatcher>,
    activity: ActivityLogger,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        updates: Arc<dyn JobUpdateStore>,
        directory: Arc<dyn Directory>,
        dispatcher: Arc<NotificationDispatcher>,
        activity: ActivityLogger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            updates,
            directory,
            dispatcher,
            activity,
            clock,
        }
    }

    /// Next job code for the tenant: `J-NNN` from the highest existing
    /// numeric suffix.
    async fn generate_job_code(&self, business_id: &str) -> Result<String> {
        let jobs = self.jobs.find_all(business_id).await?;
        let max = jobs
            .iter()
            .filter_map(|j| j.code.strip_prefix("J-"))
            .filter_map(|s| s.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("J-{:03}", max + 1))
    }

    /// Create a job. Attempts one booked notification when a customer email
    /// can be resolved; writes one `job_created` activity entry. Returns the
    /// persisted job even if every side effect fails.
    pub async fn create(
        &self,
        business_id: &str,
        new: NewJob,
        actor_id: Option<i64>,
    ) -> Result<Job> {
        let now = self.clock.now();
        let code = self.generate_job_code(business_id).await?;
        let job = Job {
            id: 0,
            business_id: business_id.to_string(),
            code,
            status: JobStatus::WaitingAssessment,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            assignee_id: new.assignee_id,
            description: new.description,
            estimated_hours: new.estimated_hours,
            actual_hours: None,
            customer_notified: false,
            created_at: now,
            updated_at: now,
        };
        let job = self.jobs.create(job).await?;
        tracing::info!("🔧 Job {} created for {business_id}", job.code);

        let contact = self.resolve_contact(&job).await;
        if contact.email.is_some() {
            let delivered = self
                .notify(NotificationKind::JobBooked, &job, &contact)
                .await;
            if !delivered {
                tracing::warn!("⚠️ Booked notification for {} not delivered", job.code);
            }
        }

        self.activity
            .log(
                business_id,
                actor_id,
                "job_created",
                "job",
                &job.id.to_string(),
                json!({"code": job.code}),
            )
            .await;

        Ok(job)
    }

    /// Apply a partial update. NotFound when the job does not exist; every
    /// other failure past the persistence write degrades to a log line.
    pub async fn update(
        &self,
        business_id: &str,
        id: i64,
        patch: JobPatch,
        actor_id: Option<i64>,
    ) -> Result<Job> {
        let prior = self
            .jobs
            .find_by_id(business_id, id)
            .await?
            .ok_or_else(|| FixHubError::not_found("job", id))?;

        let mut job = prior.clone();
        changes::apply_job_patch(&mut job, &patch);
        job.updated_at = self.clock.now();
        let mut job = self.jobs.update(&job).await?;

        let changes = changes::detect_job_changes(&prior, &job, &patch);

        if let Some(change) = changes.status {
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "job_status_changed",
                    "job",
                    &job.id.to_string(),
                    json!({
                        "code": job.code,
                        "from": change.from.label(),
                        "to": change.to.label(),
                    }),
                )
                .await;

            if change.to == JobStatus::Completed {
                self.activity
                    .log(
                        business_id,
                        actor_id,
                        "job_completed",
                        "job",
                        &job.id.to_string(),
                        json!({"code": job.code}),
                    )
                    .await;
            }
        }

        if changes.terminal == Some(JobStatus::ReadyForPickup) {
            let contact = self.resolve_contact(&job).await;
            if contact.email.is_some() || contact.phone.is_some() {
                let delivered = self
                    .notify(NotificationKind::JobReadyForPickup, &job, &contact)
                    .await;
                if delivered {
                    job.customer_notified = true;
                    if let Err(e) = self.jobs.update(&job).await {
                        tracing::warn!("⚠️ Failed to persist notified flag on {}: {e}", job.code);
                    }
                } else {
                    tracing::warn!("⚠️ Pickup notification for {} not delivered", job.code);
                }
            }
        }

        if !changes.fields.is_empty() {
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "job_updated",
                    "job",
                    &job.id.to_string(),
                    json!({"code": job.code, "fields": changes.fields}),
                )
                .await;
        }

        Ok(job)
    }

    /// Delete a job. The pre-fetch only feeds the audit description; its
    /// failure does not block the deletion.
    pub async fn delete(
        &self,
        business_id: &str,
        id: i64,
        actor_id: Option<i64>,
    ) -> Result<bool> {
        let prior = match self.jobs.find_by_id(business_id, id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("⚠️ Pre-delete fetch of job {id} failed: {e}");
                None
            }
        };

        let found = self.jobs.delete(business_id, id).await?;
        if found {
            let code = prior
                .map(|j| j.code)
                .unwrap_or_else(|| id.to_string());
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "job_deleted",
                    "job",
                    &id.to_string(),
                    json!({"code": code}),
                )
                .await;
        }
        Ok(found)
    }

    /// Refresh `updated_at` only. Used by dependent-entity writers (notes,
    /// parts, linked orders) to keep the parent's recency indicator accurate.
    /// No notification, no audit entry.
    pub async fn touch(&self, business_id: &str, id: i64) -> Result<()> {
        if let Some(mut job) = self.jobs.find_by_id(business_id, id).await? {
            job.updated_at = self.clock.now();
            self.jobs.update(&job).await?;
        }
        Ok(())
    }

    /// Attach a note to a job. Public notes surface through the tracking
    /// lookup. Touches the parent; no audit entry of its own.
    pub async fn add_update(
        &self,
        business_id: &str,
        job_id: i64,
        note: &str,
        public: bool,
        author_id: Option<i64>,
    ) -> Result<JobUpdate> {
        self.jobs
            .find_by_id(business_id, job_id)
            .await?
            .ok_or_else(|| FixHubError::not_found("job", job_id))?;

        let update = self
            .updates
            .create(JobUpdate {
                id: 0,
                job_id,
                business_id: business_id.to_string(),
                note: note.to_string(),
                public,
                author_id,
                created_at: self.clock.now(),
            })
            .await?;

        if let Err(e) = self.touch(business_id, job_id).await {
            tracing::warn!("⚠️ Touch after note on job {job_id} failed: {e}");
        }
        Ok(update)
    }

    /// Unauthenticated tracking lookup: job code plus customer email must
    /// both match; returns the public notes only.
    pub async fn tracking_updates(
        &self,
        business_id: &str,
        code: &str,
        email: &str,
    ) -> Result<Vec<JobUpdate>> {
        let jobs = self.jobs.find_all(business_id).await?;
        let job = jobs
            .into_iter()
            .find(|j| j.code == code)
            .ok_or_else(|| FixHubError::not_found("job", code))?;

        let contact = self.resolve_contact(&job).await;
        let matches = contact
            .email
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(email));
        if !matches {
            return Err(FixHubError::not_found("job", code));
        }

        let mut updates = self.updates.for_job(business_id, job.id).await?;
        updates.retain(|u| u.public);
        Ok(updates)
    }

    /// Counts by status for the weekly report.
    pub async fn status_counts(&self, business_id: &str) -> Result<Vec<(JobStatus, usize)>> {
        let jobs = self.jobs.find_all(business_id).await?;
        let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
        Ok(vec![
            (JobStatus::WaitingAssessment, count(JobStatus::WaitingAssessment)),
            (JobStatus::InProgress, count(JobStatus::InProgress)),
            (JobStatus::OnHold, count(JobStatus::OnHold)),
            (JobStatus::ReadyForPickup, count(JobStatus::ReadyForPickup)),
            (JobStatus::Completed, count(JobStatus::Completed)),
        ])
    }

    async fn resolve_contact(&self, job: &Job) -> Contact {
        if let Some(customer_id) = job.customer_id {
            match self
                .directory
                .find_customer_by_id(&job.business_id, customer_id)
                .await
                .map_err(|e| SideEffectError::Lookup(e.to_string()))
            {
                Ok(Some(customer)) => {
                    return Contact {
                        name: Some(customer.name),
                        email: customer.email,
                        phone: customer.phone,
                    };
                }
                Ok(None) => {
                    tracing::warn!(
                        "⚠️ Job {} references missing customer {customer_id}",
                        job.code
                    );
                }
                Err(e) => tracing::warn!("⚠️ Customer lookup for {} failed: {e}", job.code),
            }
        }
        Contact {
            name: job.customer_name.clone(),
            email: job.customer_email.clone(),
            phone: job.customer_phone.clone(),
        }
    }

    async fn business_name(&self, business_id: &str) -> String {
        match self.directory.get_business(business_id).await {
            Ok(Some(business)) => business.name,
            Ok(None) => business_id.to_string(),
            Err(e) => {
                tracing::warn!("⚠️ Business lookup for {business_id} failed: {e}");
                business_id.to_string()
            }
        }
    }

    async fn notify(&self, kind: NotificationKind, job: &Job, contact: &Contact) -> bool {
        let business_name = self.business_name(&job.business_id).await;
        let ctx = RenderContext::new(&job.business_id, &business_name)
            .recipient(contact.name.as_deref())
            .job(job);
        let recipient = Recipient {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            channel: Default::default(),
        };
        self.dispatcher.send_notification(kind, &recipient, &ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{rig, RigOptions};
    use fixhub_core::types::NewJob;

    fn booked_job() -> NewJob {
        NewJob {
            customer_name: Some("Sam".into()),
            customer_email: Some("sam@example.com".into()),
            description: "Stihl chainsaw".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_email_attempts_one_booked_notification() {
        let rig = rig(RigOptions::default()).await;
        let job = rig
            .jobs
            .create("biz-1", booked_job(), Some(7))
            .await
            .unwrap();

        assert_eq!(job.code, "J-001");
        assert_eq!(job.status, JobStatus::WaitingAssessment);

        let sent = rig.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "sam@example.com");
        assert!(sent[0].subject.contains("J-001"));

        let activities = rig.activities("biz-1").await;
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity_type, "job_created");
        assert_eq!(activities[0].description, "Created job J-001");
        assert_eq!(activities[0].actor_id, Some(7));
    }

    #[tokio::test]
    async fn test_create_without_email_attempts_nothing() {
        let rig = rig(RigOptions::default()).await;
        rig.jobs
            .create(
                "biz-1",
                NewJob {
                    customer_name: Some("Walk-in".into()),
                    description: "blade sharpen".into(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert!(rig.sent.lock().unwrap().is_empty());
        assert_eq!(rig.activities("biz-1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_resolves_referenced_customer_email() {
        let rig = rig(RigOptions::default()).await;
        let customer = rig.customer("biz-1", "Dana", Some("dana@example.com")).await;
        rig.jobs
            .create(
                "biz-1",
                NewJob {
                    customer_id: Some(customer.id),
                    description: "hedge trimmer".into(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let sent = rig.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "dana@example.com");
    }

    #[tokio::test]
    async fn test_failing_transports_do_not_affect_the_mutation() {
        let rig = rig(RigOptions { transports_fail: true }).await;
        let job = rig
            .jobs
            .create("biz-1", booked_job(), None)
            .await
            .unwrap();

        assert_eq!(job.code, "J-001");
        assert_eq!(job.description, "Stihl chainsaw");
        // Mutation persisted despite zero deliveries.
        assert!(rig.job("biz-1", job.id).await.is_some());
        assert!(rig.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unchanged_status_writes_no_status_entry() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();

        rig.jobs
            .update(
                "biz-1",
                job.id,
                JobPatch {
                    status: Some(JobStatus::WaitingAssessment),
                    description: Some("Stihl MS 180 chainsaw".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let activities = rig.activities("biz-1").await;
        let status_entries: Vec<_> = activities
            .iter()
            .filter(|a| a.activity_type == "job_status_changed")
            .collect();
        assert!(status_entries.is_empty());

        let updated: Vec<_> = activities
            .iter()
            .filter(|a| a.activity_type == "job_updated")
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(
            updated[0].description,
            "Updated job J-001: changed description"
        );
    }

    #[tokio::test]
    async fn test_pickup_transition_audits_once_and_notifies() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        rig.sent.lock().unwrap().clear();

        let job = rig
            .jobs
            .update(
                "biz-1",
                job.id,
                JobPatch {
                    status: Some(JobStatus::ReadyForPickup),
                    actual_hours: Some(2.5),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert!(job.customer_notified);

        let activities = rig.activities("biz-1").await;
        let status_entries: Vec<_> = activities
            .iter()
            .filter(|a| a.activity_type == "job_status_changed")
            .collect();
        assert_eq!(status_entries.len(), 1);
        assert_eq!(
            status_entries[0].description,
            "Changed job J-001 status from Waiting Assessment to Ready for Pickup"
        );

        let updated: Vec<_> = activities
            .iter()
            .filter(|a| a.activity_type == "job_updated")
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].metadata["fields"][0], "actual_hours");

        let sent = rig.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("ready for pickup"));
    }

    #[tokio::test]
    async fn test_completion_writes_both_entries() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();

        rig.jobs
            .update(
                "biz-1",
                job.id,
                JobPatch {
                    status: Some(JobStatus::Completed),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let activities = rig.activities("biz-1").await;
        assert_eq!(
            activities
                .iter()
                .filter(|a| a.activity_type == "job_status_changed")
                .count(),
            1
        );
        assert_eq!(
            activities
                .iter()
                .filter(|a| a.activity_type == "job_completed")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_hold_round_trip_two_entries_zero_pickup_notifications() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        rig.sent.lock().unwrap().clear();

        for status in [JobStatus::InProgress, JobStatus::OnHold, JobStatus::InProgress] {
            rig.jobs
                .update(
                    "biz-1",
                    job.id,
                    JobPatch {
                        status: Some(status),
                        ..Default::default()
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let activities = rig.activities("biz-1").await;
        // waiting→in_progress, in_progress→on_hold, on_hold→in_progress
        assert_eq!(
            activities
                .iter()
                .filter(|a| a.activity_type == "job_status_changed")
                .count(),
            3
        );
        assert!(rig.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_job_is_not_found() {
        let rig = rig(RigOptions::default()).await;
        let err = rig
            .jobs
            .update("biz-1", 999, JobPatch::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FixHubError::NotFound(_)));
        assert!(rig.activities("biz-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_semantics() {
        let rig = rig(RigOptions::default()).await;
        assert!(!rig.jobs.delete("biz-1", 999, None).await.unwrap());
        assert!(rig.activities("biz-1").await.is_empty());

        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        assert!(rig.jobs.delete("biz-1", job.id, None).await.unwrap());

        let activities = rig.activities("biz-1").await;
        let deleted: Vec<_> = activities
            .iter()
            .filter(|a| a.activity_type == "job_deleted")
            .collect();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].description, "Deleted job J-001");
    }

    #[tokio::test]
    async fn test_touch_bumps_timestamp_without_side_effects() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        let audit_before = rig.activities("biz-1").await.len();
        rig.sent.lock().unwrap().clear();

        rig.clock.advance(chrono::Duration::minutes(5));
        rig.jobs.touch("biz-1", job.id).await.unwrap();

        let stored = rig.job("biz-1", job.id).await.unwrap();
        assert!(stored.updated_at > job.updated_at);
        assert_eq!(rig.activities("biz-1").await.len(), audit_before);
        assert!(rig.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tracking_lookup_requires_email_match_and_filters_private() {
        let rig = rig(RigOptions::default()).await;
        let job = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        rig.jobs
            .add_update("biz-1", job.id, "Waiting on parts", true, Some(7))
            .await
            .unwrap();
        rig.jobs
            .add_update("biz-1", job.id, "Customer was difficult", false, Some(7))
            .await
            .unwrap();

        let visible = rig
            .jobs
            .tracking_updates("biz-1", "J-001", "SAM@example.com")
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].note, "Waiting on parts");

        let err = rig
            .jobs
            .tracking_updates("biz-1", "J-001", "wrong@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, FixHubError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_job_codes_increment_per_tenant() {
        let rig = rig(RigOptions::default()).await;
        let first = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        let second = rig.jobs.create("biz-1", booked_job(), None).await.unwrap();
        let other = rig.jobs.create("biz-2", booked_job(), None).await.unwrap();
        assert_eq!(first.code, "J-001");
        assert_eq!(second.code, "J-002");
        assert_eq!(other.code, "J-001");
    }
}
