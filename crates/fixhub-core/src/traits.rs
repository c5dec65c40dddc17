//! Trait seams between the lifecycle core and its collaborators.
//!
//! Persistence, directory lookup, outbound transports, and the audit sink
//! are all abstract here; concrete implementations live in `fixhub-store`
//! and `fixhub-transports`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    ActivityLogEntry, Business, Customer, EmailHistoryRecord, Job, JobUpdate, NewActivity,
    Order, OrderItem, PartOnOrder, PartOrderUpdate, StaffNotification, User, UserRole,
};

// ═══════════════════════════════════════════════════════
// Outbound transports
// ═══════════════════════════════════════════════════════

/// Which kind of channel a transport serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

/// A rendered message ready for one outbound attempt.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// One outbound channel implementation (one email provider or SMS gateway).
///
/// Adapter availability is decided at construction time from the presence of
/// its credentials; `send` makes exactly one delivery attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;
    fn channel(&self) -> ChannelKind;
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

// ═══════════════════════════════════════════════════════
// Entity stores (tenant-scoped)
// ═══════════════════════════════════════════════════════

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<Job>>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<Job>>;
    async fn create(&self, job: Job) -> Result<Job>;
    /// Replace the stored row; returns the persisted snapshot.
    async fn update(&self, job: &Job) -> Result<Job>;
    async fn delete(&self, business_id: &str, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<Order>>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<Order>>;
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<Order>;
    async fn update(&self, order: &Order) -> Result<Order>;
    /// Deletes the order and cascades its items.
    async fn delete(&self, business_id: &str, id: i64) -> Result<bool>;
    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>>;
}

#[async_trait]
pub trait PartStore: Send + Sync {
    async fn find_by_id(&self, business_id: &str, id: i64) -> Result<Option<PartOnOrder>>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<PartOnOrder>>;
    async fn create(&self, part: PartOnOrder) -> Result<PartOnOrder>;
    async fn update(&self, part: &PartOnOrder) -> Result<PartOnOrder>;
    async fn delete(&self, business_id: &str, id: i64) -> Result<bool>;
    async fn add_update(&self, update: PartOrderUpdate) -> Result<PartOrderUpdate>;
    async fn updates(&self, part_id: i64) -> Result<Vec<PartOrderUpdate>>;
}

#[async_trait]
pub trait JobUpdateStore: Send + Sync {
    async fn create(&self, update: JobUpdate) -> Result<JobUpdate>;
    async fn for_job(&self, business_id: &str, job_id: i64) -> Result<Vec<JobUpdate>>;
}

#[async_trait]
pub trait StaffNotificationStore: Send + Sync {
    async fn create(&self, notification: StaffNotification) -> Result<StaffNotification>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<StaffNotification>>;
}

// ═══════════════════════════════════════════════════════
// Directory lookup
// ═══════════════════════════════════════════════════════

/// Customer / business / user lookup collaborator.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_customer_by_id(&self, business_id: &str, id: i64) -> Result<Option<Customer>>;
    async fn find_customer_by_email(
        &self,
        business_id: &str,
        email: &str,
    ) -> Result<Option<Customer>>;
    async fn get_business(&self, business_id: &str) -> Result<Option<Business>>;
    async fn users_by_role(&self, business_id: &str, role: UserRole) -> Result<Vec<User>>;
    /// All active tenants — used by recurring batch tasks.
    async fn list_businesses(&self) -> Result<Vec<Business>>;
}

// ═══════════════════════════════════════════════════════
// Side-effect sinks
// ═══════════════════════════════════════════════════════

/// Append-only audit sink. The `ActivityLogger` wrapper guarantees callers
/// above it never see an error from here.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, activity: NewActivity) -> Result<ActivityLogEntry>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<ActivityLogEntry>>;
    /// Bulk retention cleanup; returns the number of rows removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Append-only log of outbound email attempts.
#[async_trait]
pub trait EmailHistoryStore: Send + Sync {
    async fn record(&self, record: EmailHistoryRecord) -> Result<()>;
    async fn find_all(&self, business_id: &str) -> Result<Vec<EmailHistoryRecord>>;
}
