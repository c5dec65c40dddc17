//! Recurring task bodies. Idempotent and best-effort: the weekly report
//! continues past per-tenant failures instead of aborting the batch, and the
//! cleanup just reports how much it removed.

use std::sync::Arc;

use chrono::Duration;

use fixhub_core::clock::Clock;
use fixhub_core::error::Result;
use fixhub_core::traits::{AuditSink, Directory};
use fixhub_core::types::{Business, JobStatus};
use fixhub_notify::{
    NotificationDispatcher, NotificationKind, Recipient, RenderContext, WeeklyReportStats,
};
use fixhub_services::{JobService, OrderService};

/// Weekly per-tenant job report, emailed to the business address.
pub struct WeeklyReportTask {
    directory: Arc<dyn Directory>,
    jobs: Arc<JobService>,
    orders: Arc<OrderService>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl WeeklyReportTask {
    pub fn new(
        directory: Arc<dyn Directory>,
        jobs: Arc<JobService>,
        orders: Arc<OrderService>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            directory,
            jobs,
            orders,
            dispatcher,
        }
    }

    /// Iterate every active tenant; one dispatch per tenant. Returns the
    /// number of tenants actually notified.
    pub async fn run(&self) -> Result<u32> {
        let businesses = self.directory.list_businesses().await?;
        let mut notified = 0u32;
        for business in &businesses {
            match self.report_for(business).await {
                Ok(true) => notified += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("⚠️ Weekly report for {} failed: {e}", business.id);
                }
            }
        }
        tracing::info!(
            "📊 Weekly report: {notified}/{} tenant(s) notified",
            businesses.len()
        );
        Ok(notified)
    }

    async fn report_for(&self, business: &Business) -> Result<bool> {
        let Some(email) = &business.email else {
            tracing::debug!("Tenant {} has no report address — skipping", business.id);
            return Ok(false);
        };

        let counts = self.jobs.status_counts(&business.id).await?;
        let count_of = |status: JobStatus| {
            counts
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };
        let waiting = count_of(JobStatus::WaitingAssessment);
        let in_progress = count_of(JobStatus::InProgress);
        let on_hold = count_of(JobStatus::OnHold);
        let ready = count_of(JobStatus::ReadyForPickup);
        let stats = WeeklyReportStats {
            total_jobs: waiting + in_progress + on_hold + ready,
            waiting_assessment: waiting,
            in_progress,
            on_hold,
            ready_for_pickup: ready,
            completed: count_of(JobStatus::Completed),
            open_orders: self.orders.open_count(&business.id).await?,
        };

        let ctx = RenderContext::new(&business.id, &business.name).report(&stats);
        let delivered = self
            .dispatcher
            .send_notification(
                NotificationKind::WeeklyReport,
                &Recipient::email(email.clone()),
                &ctx,
            )
            .await;
        Ok(delivered)
    }
}

/// Deletes activity rows past the retention window.
pub struct DailyCleanupTask {
    audit: Arc<dyn AuditSink>,
    retention_days: i64,
    clock: Arc<dyn Clock>,
}

impl DailyCleanupTask {
    pub fn new(audit: Arc<dyn AuditSink>, retention_days: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            audit,
            retention_days,
            clock,
        }
    }

    /// Returns the number of rows removed.
    pub async fn run(&self) -> Result<u64> {
        let cutoff = self.clock.now() - Duration::days(self.retention_days);
        let removed = self.audit.delete_older_than(cutoff).await?;
        tracing::info!(
            "🧹 Activity cleanup: removed {removed} record(s) older than {} day(s)",
            self.retention_days
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fixhub_audit::ActivityLogger;
    use fixhub_core::clock::ManualClock;
    use fixhub_core::traits::EmailHistoryStore;
    use fixhub_core::types::{NewJob, NewActivity};
    use fixhub_notify::NotificationDispatcher;
    use fixhub_services::{JobService, OrderService, StaffNotifier};
    use fixhub_store::MemoryStore;

    struct TaskRig {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        report: WeeklyReportTask,
        cleanup: DailyCleanupTask,
    }

    async fn task_rig() -> TaskRig {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at(
            chrono::Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
        ));

        store
            .seed_business(Business {
                id: "biz-1".into(),
                name: "North Shore Repairs".into(),
                email: Some("owner@example.com".into()),
                phone: None,
                active: true,
                created_at: clock.now(),
            })
            .await;
        store
            .seed_business(Business {
                id: "biz-2".into(),
                name: "Valley Mowers".into(),
                email: None, // skipped by the report
                phone: None,
                active: true,
                created_at: clock.now(),
            })
            .await;

        // Demo adapters: every dispatch succeeds and lands in email history.
        let dispatcher = Arc::new(NotificationDispatcher::from_config(
            &fixhub_core::config::NotifyConfig::default(),
            store.clone(),
        ));
        let activity = ActivityLogger::new(store.clone());
        let staff = StaffNotifier::new(store.clone(), store.clone(), clock.clone());
        let jobs = Arc::new(JobService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            activity.clone(),
            clock.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            staff,
            activity,
            jobs.clone(),
            clock.clone(),
        ));

        let report = WeeklyReportTask::new(
            store.clone(),
            jobs.clone(),
            orders,
            dispatcher,
        );
        let cleanup = DailyCleanupTask::new(store.clone(), 365, clock.clone());

        TaskRig {
            store,
            clock,
            report,
            cleanup,
        }
    }

    #[tokio::test]
    async fn test_weekly_report_notifies_tenants_with_email() {
        let rig = task_rig().await;
        // Two open jobs for the tenant with a report address.
        for _ in 0..2 {
            rig.report
                .jobs
                .create(
                    "biz-1",
                    NewJob {
                        description: "mower".into(),
                        ..Default::default()
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let notified = rig.report.run().await.unwrap();
        assert_eq!(notified, 1); // biz-2 has no address and is skipped

        let history = EmailHistoryStore::find_all(&*rig.store, "biz-1")
            .await
            .unwrap();
        let reports: Vec<_> = history
            .iter()
            .filter(|r| r.kind == "weekly_report")
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].recipient, "owner@example.com");
        assert!(reports[0].body.contains("Open jobs: 2"));

        assert!(
            EmailHistoryStore::find_all(&*rig.store, "biz-2")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_weekly_report_is_idempotent_per_run() {
        let rig = task_rig().await;
        assert_eq!(rig.report.run().await.unwrap(), 1);
        assert_eq!(rig.report.run().await.unwrap(), 1);
        let history = EmailHistoryStore::find_all(&*rig.store, "biz-1")
            .await
            .unwrap();
        assert_eq!(history.len(), 2); // one per run, nothing batched up
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_rows() {
        let rig = task_rig().await;
        AuditSink::append(
            &*rig.store,
            NewActivity {
                business_id: "biz-1".into(),
                actor_id: None,
                activity_type: "job_created".into(),
                description: "Created job J-001".into(),
                entity_type: "job".into(),
                entity_id: "1".into(),
                metadata: serde_json::Value::Null,
            },
        )
        .await
        .unwrap();

        // Retention window still covers the row.
        assert_eq!(rig.cleanup.run().await.unwrap(), 0);
        assert_eq!(AuditSink::find_all(&*rig.store, "biz-1").await.unwrap().len(), 1);

        // Far past the retention window: everything goes.
        rig.clock.advance(Duration::days(10_000));
        assert_eq!(rig.cleanup.run().await.unwrap(), 1);
        assert!(AuditSink::find_all(&*rig.store, "biz-1").await.unwrap().is_empty());
    }
}
