//! Shared test rig: in-memory stores, fake transports, pinned clock, and
//! fully wired services.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::TimeZone;

use fixhub_audit::ActivityLogger;
use fixhub_core::clock::{Clock, ManualClock};
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{
    AuditSink, ChannelKind, OrderStore, OutboundMessage, StaffNotificationStore, Transport,
};
use fixhub_core::types::{
    ActivityLogEntry, Business, Customer, Job, OrderItem, StaffNotification, User, UserRole,
};
use fixhub_notify::NotificationDispatcher;
use fixhub_store::MemoryStore;

use crate::jobs::JobService;
use crate::orders::OrderService;
use crate::parts::PartService;
use crate::staff::StaffNotifier;

pub struct FakeTransport {
    kind: ChannelKind,
    fail: bool,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

#[async_trait]
impl Transport for FakeTransport {
    fn name(&self) -> &str {
        match self.kind {
            ChannelKind::Email => "fake-email",
            ChannelKind::Sms => "fake-sms",
        }
    }

    fn channel(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        if self.fail {
            return Err(FixHubError::Transport("transport down".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RigOptions {
    pub transports_fail: bool,
}

pub struct Rig {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub sent: Arc<Mutex<Vec<OutboundMessage>>>,
    pub sms_sent: Arc<Mutex<Vec<OutboundMessage>>>,
    pub jobs: Arc<JobService>,
    pub orders: OrderService,
    pub parts: PartService,
}

impl Rig {
    pub async fn activities(&self, business_id: &str) -> Vec<ActivityLogEntry> {
        AuditSink::find_all(&*self.store, business_id).await.unwrap()
    }

    pub async fn job(&self, business_id: &str, id: i64) -> Option<Job> {
        fixhub_core::traits::JobStore::find_by_id(&*self.store, business_id, id)
            .await
            .unwrap()
    }

    pub async fn order_items(&self, order_id: i64) -> Vec<OrderItem> {
        OrderStore::items(&*self.store, order_id).await.unwrap()
    }

    pub async fn staff_notifications(&self, business_id: &str) -> Vec<StaffNotification> {
        StaffNotificationStore::find_all(&*self.store, business_id)
            .await
            .unwrap()
    }

    pub async fn customer(
        &self,
        business_id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Customer {
        self.store
            .seed_customer(Customer {
                id: 0,
                business_id: business_id.into(),
                name: name.into(),
                email: email.map(String::from),
                phone: None,
            })
            .await
    }

    pub async fn staff_user(&self, business_id: &str, email: &str) -> User {
        self.seed_user(business_id, email, UserRole::Staff).await
    }

    pub async fn admin_user(&self, business_id: &str, email: &str) -> User {
        self.seed_user(business_id, email, UserRole::Admin).await
    }

    async fn seed_user(&self, business_id: &str, email: &str, role: UserRole) -> User {
        self.store
            .seed_user(User {
                id: 0,
                business_id: business_id.into(),
                email: email.into(),
                name: email.split('@').next().unwrap_or("user").into(),
                role,
            })
            .await
    }
}

/// Build a fully wired rig with two seeded tenants and a clock pinned to
/// 2026-08-05 10:00 UTC.
pub async fn rig(options: RigOptions) -> Rig {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at(
        chrono::Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
    ));

    for (id, name) in [("biz-1", "North Shore Repairs"), ("biz-2", "Valley Mowers")] {
        store
            .seed_business(Business {
                id: id.into(),
                name: name.into(),
                email: Some(format!("owner@{id}.example.com")),
                phone: None,
                active: true,
                created_at: clock.now(),
            })
            .await;
    }

    let sent = Arc::new(Mutex::new(Vec::new()));
    let sms_sent = Arc::new(Mutex::new(Vec::new()));
    let email: Box<dyn Transport> = Box::new(FakeTransport {
        kind: ChannelKind::Email,
        fail: options.transports_fail,
        sent: sent.clone(),
    });
    let sms: Box<dyn Transport> = Box::new(FakeTransport {
        kind: ChannelKind::Sms,
        fail: options.transports_fail,
        sent: sms_sent.clone(),
    });

    let dispatcher = Arc::new(NotificationDispatcher::with_chains(
        "FixHub <noreply@fixhub.app>",
        vec![email],
        vec![sms],
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
    let orders = OrderService::new(
        store.clone(),
        store.clone(),
        dispatcher.clone(),
        staff.clone(),
        activity.clone(),
        jobs.clone(),
        clock.clone(),
    );
    let parts = PartService::new(
        store.clone(),
        store.clone(),
        dispatcher,
        activity,
        jobs.clone(),
        clock.clone(),
    );

    Rig {
        store,
        clock,
        sent,
        sms_sent,
        jobs,
        orders,
        parts,
    }
}
