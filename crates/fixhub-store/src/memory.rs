//! In-memory store — implements every core store trait behind one
//! `RwLock`-guarded state block.
//!
//! Tenant scoping is enforced here: every read filters on `business_id`,
//! every delete checks it before touching a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use fixhub_core::error::Result;
use fixhub_core::traits::{
    AuditSink, Directory, EmailHistoryStore, JobStore, JobUpdateStore, OrderStore, PartStore,
    StaffNotificationStore,
};
use fixhub_core::types::{
    ActivityLogEntry, Business, Customer, EmailHistoryRecord, Job, JobUpdate, NewActivity, Order,
    OrderItem, PartOnOrder, PartOrderUpdate, StaffNotification, User, UserRole,
};

#[derive(Default)]
struct Inner {
    businesses: Vec<Business>,
    customers: Vec<Customer>,
    users: Vec<User>,
    jobs: Vec<Job>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    parts: Vec<PartOnOrder>,
    part_updates: Vec<PartOrderUpdate>,
    job_updates: Vec<JobUpdate>,
    staff_notifications: Vec<StaffNotification>,
    activities: Vec<ActivityLogEntry>,
    emails: Vec<EmailHistoryRecord>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory implementation of all store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tenant record.
    pub async fn seed_business(&self, business: Business) {
        self.inner.write().await.businesses.push(business);
    }

    /// Seed a customer record, assigning an id.
    pub async fn seed_customer(&self, mut customer: Customer) -> Customer {
        let mut inner = self.inner.write().await;
        customer.id = inner.next_id();
        inner.customers.push(customer.clone());
        customer
    }

    /// Seed a user record, assigning an id.
    pub async fn seed_user(&self, mut user: User) -> User {
        let mut inner = self.inner.write().await;
        user.id = inner.next_id();
        inner.users.push(user.clone());
        user
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .find(|j| j.business_id == business_id && j.id == id)
            .cloned())
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut job: Job) -> Result<Job> {
        let mut inner = self.inner.write().await;
        job.id = inner.next_id();
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn update(&self, job: &Job) -> Result<Job> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner
            .jobs
            .iter_mut()
            .find(|j| j.business_id == job.business_id && j.id == job.id)
        {
            *stored = job.clone();
        }
        Ok(job.clone())
    }

    async fn delete(&self, business_id: &str, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.jobs.len();
        inner
            .jobs
            .retain(|j| !(j.business_id == business_id && j.id == id));
        Ok(inner.jobs.len() < before)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.business_id == business_id && o.id == id)
            .cloned())
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut order: Order, items: Vec<OrderItem>) -> Result<Order> {
        let mut inner = self.inner.write().await;
        order.id = inner.next_id();
        for mut item in items {
            item.id = inner.next_id();
            item.order_id = order.id;
            inner.order_items.push(item);
        }
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn update(&self, order: &Order) -> Result<Order> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner
            .orders
            .iter_mut()
            .find(|o| o.business_id == order.business_id && o.id == order.id)
        {
            *stored = order.clone();
        }
        Ok(order.clone())
    }

    async fn delete(&self, business_id: &str, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.orders.len();
        inner
            .orders
            .retain(|o| !(o.business_id == business_id && o.id == id));
        let found = inner.orders.len() < before;
        if found {
            inner.order_items.retain(|i| i.order_id != id);
        }
        Ok(found)
    }

    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PartStore for MemoryStore {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<PartOnOrder>> {
        let inner = self.inner.read().await;
        Ok(inner
            .parts
            .iter()
            .find(|p| p.business_id == business_id && p.id == id)
            .cloned())
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<PartOnOrder>> {
        let inner = self.inner.read().await;
        Ok(inner
            .parts
            .iter()
            .filter(|p| p.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut part: PartOnOrder) -> Result<PartOnOrder> {
        let mut inner = self.inner.write().await;
        part.id = inner.next_id();
        inner.parts.push(part.clone());
        Ok(part)
    }

    async fn update(&self, part: &PartOnOrder) -> Result<PartOnOrder> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner
            .parts
            .iter_mut()
            .find(|p| p.business_id == part.business_id && p.id == part.id)
        {
            *stored = part.clone();
        }
        Ok(part.clone())
    }

    async fn delete(&self, business_id: &str, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.parts.len();
        inner
            .parts
            .retain(|p| !(p.business_id == business_id && p.id == id));
        let found = inner.parts.len() < before;
        if found {
            inner.part_updates.retain(|u| u.part_id != id);
        }
        Ok(found)
    }

    async fn add_update(&self, mut update: PartOrderUpdate) -> Result<PartOrderUpdate> {
        let mut inner = self.inner.write().await;
        update.id = inner.next_id();
        inner.part_updates.push(update.clone());
        Ok(update)
    }

    async fn updates(&self, part_id: i64) -> Result<Vec<PartOrderUpdate>> {
        let inner = self.inner.read().await;
        Ok(inner
            .part_updates
            .iter()
            .filter(|u| u.part_id == part_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobUpdateStore for MemoryStore {
    async fn create(&self, mut update: JobUpdate) -> Result<JobUpdate> {
        let mut inner = self.inner.write().await;
        update.id = inner.next_id();
        inner.job_updates.push(update.clone());
        Ok(update)
    }

    async fn for_job(&self, business_id: &str, job_id: i64) -> Result<Vec<JobUpdate>> {
        let inner = self.inner.read().await;
        Ok(inner
            .job_updates
            .iter()
            .filter(|u| u.business_id == business_id && u.job_id == job_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StaffNotificationStore for MemoryStore {
    async fn create(&self, notification: StaffNotification) -> Result<StaffNotification> {
        let mut inner = self.inner.write().await;
        inner.staff_notifications.push(notification.clone());
        Ok(notification)
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<StaffNotification>> {
        let inner = self.inner.read().await;
        Ok(inner
            .staff_notifications
            .iter()
            .filter(|n| n.business_id == business_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_customer_by_id(&self, business_id: &str, id: i64) -> Result<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .iter()
            .find(|c| c.business_id == business_id && c.id == id)
            .cloned())
    }

    async fn find_customer_by_email(
        &self,
        business_id: &str,
        email: &str,
    ) -> Result<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .iter()
            .find(|c| {
                c.business_id == business_id
                    && c.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn get_business(&self, business_id: &str) -> Result<Option<Business>> {
        let inner = self.inner.read().await;
        Ok(inner.businesses.iter().find(|b| b.id == business_id).cloned())
    }

    async fn users_by_role(&self, business_id: &str, role: UserRole) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.business_id == business_id && u.role == role)
            .cloned()
            .collect())
    }

    async fn list_businesses(&self) -> Result<Vec<Business>> {
        let inner = self.inner.read().await;
        Ok(inner.businesses.iter().filter(|b| b.active).cloned().collect())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, activity: NewActivity) -> Result<ActivityLogEntry> {
        let mut inner = self.inner.write().await;
        let entry = ActivityLogEntry {
            id: inner.next_id(),
            business_id: activity.business_id,
            actor_id: activity.actor_id,
            activity_type: activity.activity_type,
            description: activity.description,
            entity_type: activity.entity_type,
            entity_id: activity.entity_id,
            metadata: activity.metadata,
            created_at: Utc::now(),
        };
        inner.activities.push(entry.clone());
        Ok(entry)
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<ActivityLogEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .activities
            .iter()
            .filter(|a| a.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.activities.len();
        inner.activities.retain(|a| a.created_at >= cutoff);
        Ok((before - inner.activities.len()) as u64)
    }
}

#[async_trait]
impl EmailHistoryStore for MemoryStore {
    async fn record(&self, record: EmailHistoryRecord) -> Result<()> {
        self.inner.write().await.emails.push(record);
        Ok(())
    }

    async fn find_all(&self, business_id: &str) -> Result<Vec<EmailHistoryRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .iter()
            .filter(|e| e.business_id == business_id)
            .cloned()
            .collect())
    }
}
