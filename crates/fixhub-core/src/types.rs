//! Entity model for repair-shop jobs, parts/equipment orders, and the
//! side-effect records they produce.
//!
//! Every entity carries a `business_id` — the tenant scoping key. Stores must
//! never return or mutate rows across tenants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════
// Tenant, people
// ═══════════════════════════════════════════════════════

/// Tenant record — the root scoping unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "bool_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn bool_true() -> bool {
    true
}

/// Customer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub business_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Staff user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
            UserRole::Viewer => "viewer",
        }
    }
}

/// Tenant user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub business_id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

// ═══════════════════════════════════════════════════════
// Jobs
// ═══════════════════════════════════════════════════════

/// Repair job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    WaitingAssessment,
    InProgress,
    OnHold,
    ReadyForPickup,
    Completed,
}

impl JobStatus {
    /// Wire form, matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::WaitingAssessment => "waiting_assessment",
            JobStatus::InProgress => "in_progress",
            JobStatus::OnHold => "on_hold",
            JobStatus::ReadyForPickup => "ready_for_pickup",
            JobStatus::Completed => "completed",
        }
    }

    /// Human label for notifications and audit descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::WaitingAssessment => "Waiting Assessment",
            JobStatus::InProgress => "In Progress",
            JobStatus::OnHold => "On Hold",
            JobStatus::ReadyForPickup => "Ready for Pickup",
            JobStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repair work order.
///
/// Customer contact lives either on a referenced [`Customer`] record
/// (`customer_id`) or inline as free-text name/email/phone when no record
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub business_id: String,
    /// Human-readable code, unique per tenant (e.g. `J-004`).
    pub code: String,
    pub status: JobStatus,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub estimated_hours: Option<f32>,
    #[serde(default)]
    pub actual_hours: Option<f32>,
    #[serde(default)]
    pub customer_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a job. The code and timestamps are generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub estimated_hours: Option<f32>,
}

/// Partial job update. `None` means the field was absent from the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f32>,
    #[serde(default)]
    pub actual_hours: Option<f32>,
}

/// Customer-visible or internal note attached to a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUpdate {
    pub id: i64,
    pub job_id: i64,
    pub business_id: String,
    pub note: String,
    /// Public notes are exposed through the unauthenticated tracking lookup.
    pub public: bool,
    #[serde(default)]
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════
// Orders
// ═══════════════════════════════════════════════════════

/// Parts/equipment order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    NotOrdered,
    Ordered,
    Arrived,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::NotOrdered => "not_ordered",
            OrderStatus::Ordered => "ordered",
            OrderStatus::Arrived => "arrived",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::NotOrdered => "Not Ordered",
            OrderStatus::Ordered => "Ordered",
            OrderStatus::Arrived => "Arrived",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which channels a customer wants order notifications through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannelPref {
    #[default]
    Email,
    Sms,
    Both,
}

impl NotifyChannelPref {
    pub fn wants_email(&self) -> bool {
        matches!(self, NotifyChannelPref::Email | NotifyChannelPref::Both)
    }

    pub fn wants_sms(&self) -> bool {
        matches!(self, NotifyChannelPref::Sms | NotifyChannelPref::Both)
    }
}

/// Parts/equipment procurement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub business_id: String,
    /// Unique per tenant per day: `ORD-YYYYMMDD-NNNN`.
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub supplier: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notify_on_placed: bool,
    /// Stored default; the arrival notification itself fires on the explicit
    /// per-call flag, not this field.
    #[serde(default)]
    pub notify_on_arrival: bool,
    #[serde(default)]
    pub notify_channel: NotifyChannelPref,
    #[serde(default)]
    pub job_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item owned by an [`Order`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    /// Minor units (cents).
    pub unit_price_cents: i64,
}

/// Payload for creating an order with its items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub supplier: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notify_on_placed: bool,
    #[serde(default)]
    pub notify_on_arrival: bool,
    #[serde(default)]
    pub notify_channel: NotifyChannelPref,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// Partial order update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notify_on_arrival: Option<bool>,
    #[serde(default)]
    pub notify_channel: Option<NotifyChannelPref>,
}

// ═══════════════════════════════════════════════════════
// Single-part procurement
// ═══════════════════════════════════════════════════════

/// Status of a single part on order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    Ordered,
    Arrived,
    Collected,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Ordered => "ordered",
            PartStatus::Arrived => "arrived",
            PartStatus::Collected => "collected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartStatus::Ordered => "Ordered",
            PartStatus::Arrived => "Arrived",
            PartStatus::Collected => "Collected",
        }
    }
}

impl std::fmt::Display for PartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-part procurement record, independent of [`Order`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartOnOrder {
    pub id: i64,
    pub business_id: String,
    pub name: String,
    pub status: PartStatus,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Notify the customer when the part arrives.
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub job_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPart {
    pub name: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub job_id: Option<i64>,
}

/// One row of a part's status history feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartOrderUpdate {
    pub id: i64,
    pub part_id: i64,
    pub status: PartStatus,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════
// Side-effect records
// ═══════════════════════════════════════════════════════

/// Append-only audit record. Never updated or deleted by normal flow; only
/// the retention cleanup task removes old rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub business_id: String,
    /// None = system actor.
    #[serde(default)]
    pub actor_id: Option<i64>,
    pub activity_type: String,
    pub description: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Activity record before the sink assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub business_id: String,
    pub actor_id: Option<i64>,
    pub activity_type: String,
    pub description: String,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: serde_json::Value,
}

/// Notification priority, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// In-app record fanned out to every staff/admin user of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffNotification {
    pub id: String,
    pub business_id: String,
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    pub priority: NotifyPriority,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only log of every outbound email attempt, delivered or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHistoryRecord {
    pub id: String,
    pub business_id: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub kind: String,
    pub sender: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_roundtrip() {
        let json = serde_json::to_string(&JobStatus::ReadyForPickup).unwrap();
        assert_eq!(json, "\"ready_for_pickup\"");
        let back: JobStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, JobStatus::ReadyForPickup);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(JobStatus::WaitingAssessment.label(), "Waiting Assessment");
        assert_eq!(OrderStatus::NotOrdered.label(), "Not Ordered");
        assert_eq!(PartStatus::Collected.label(), "Collected");
    }

    #[test]
    fn test_channel_pref() {
        assert!(NotifyChannelPref::Both.wants_email());
        assert!(NotifyChannelPref::Both.wants_sms());
        assert!(!NotifyChannelPref::Email.wants_sms());
        assert!(!NotifyChannelPref::Sms.wants_email());
    }

    #[test]
    fn test_patch_absent_fields_deserialize_none() {
        let patch: JobPatch = serde_json::from_str(r#"{"description": "new"}"#).unwrap();
        assert_eq!(patch.description.as_deref(), Some("new"));
        assert!(patch.status.is_none());
        assert!(patch.assignee_id.is_none());
    }
}
