//! Change detection — classifies what a persisted mutation actually changed.
//!
//! Status is compared persisted-old vs persisted-new, never against the raw
//! request: a request may omit the field or carry a value equal to the
//! current one. The changed-field list covers only fields present in the
//! patch whose stored value differs, and never includes `status` (that would
//! double-report the transition).

use fixhub_core::types::{Job, JobPatch, JobStatus, Order, OrderPatch, OrderStatus};

/// A status transition, persisted-old to persisted-new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub from: S,
    pub to: S,
}

/// Classified effects of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<S> {
    /// Present when the persisted status differs before/after.
    pub status: Option<StatusChange<S>>,
    /// Patch-present non-status fields whose stored value changed.
    pub fields: Vec<&'static str>,
    /// Present when the new status is one whose *arrival* drives a dedicated
    /// notification, regardless of the path taken to reach it.
    pub terminal: Option<S>,
}

impl<S> ChangeSet<S> {
    pub fn none() -> Self {
        Self {
            status: None,
            fields: Vec::new(),
            terminal: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.fields.is_empty() && self.terminal.is_none()
    }
}

/// Apply a job patch in place. Absent fields are left untouched.
pub fn apply_job_patch(job: &mut Job, patch: &JobPatch) {
    if let Some(status) = patch.status {
        job.status = status;
    }
    if let Some(customer_id) = patch.customer_id {
        job.customer_id = Some(customer_id);
    }
    if let Some(name) = &patch.customer_name {
        job.customer_name = Some(name.clone());
    }
    if let Some(email) = &patch.customer_email {
        job.customer_email = Some(email.clone());
    }
    if let Some(phone) = &patch.customer_phone {
        job.customer_phone = Some(phone.clone());
    }
    if let Some(assignee_id) = patch.assignee_id {
        job.assignee_id = Some(assignee_id);
    }
    if let Some(description) = &patch.description {
        job.description = description.clone();
    }
    if let Some(estimated) = patch.estimated_hours {
        job.estimated_hours = Some(estimated);
    }
    if let Some(actual) = patch.actual_hours {
        job.actual_hours = Some(actual);
    }
}

/// Classify a job mutation from its persisted before/after snapshots and the
/// patch that drove it.
pub fn detect_job_changes(prior: &Job, current: &Job, patch: &JobPatch) -> ChangeSet<JobStatus> {
    let status = (current.status != prior.status).then_some(StatusChange {
        from: prior.status,
        to: current.status,
    });

    let mut fields = Vec::new();
    if patch.customer_id.is_some() && current.customer_id != prior.customer_id {
        fields.push("customer_id");
    }
    if patch.customer_name.is_some() && current.customer_name != prior.customer_name {
        fields.push("customer_name");
    }
    if patch.customer_email.is_some() && current.customer_email != prior.customer_email {
        fields.push("customer_email");
    }
    if patch.customer_phone.is_some() && current.customer_phone != prior.customer_phone {
        fields.push("customer_phone");
    }
    if patch.assignee_id.is_some() && current.assignee_id != prior.assignee_id {
        fields.push("assignee_id");
    }
    if patch.description.is_some() && current.description != prior.description {
        fields.push("description");
    }
    if patch.estimated_hours.is_some() && current.estimated_hours != prior.estimated_hours {
        fields.push("estimated_hours");
    }
    if patch.actual_hours.is_some() && current.actual_hours != prior.actual_hours {
        fields.push("actual_hours");
    }

    let terminal = status.and_then(|c| {
        matches!(c.to, JobStatus::ReadyForPickup | JobStatus::Completed).then_some(c.to)
    });

    ChangeSet {
        status,
        fields,
        terminal,
    }
}

/// Apply an order patch in place.
pub fn apply_order_patch(order: &mut Order, patch: &OrderPatch) {
    if let Some(status) = patch.status {
        order.status = status;
    }
    if let Some(supplier) = &patch.supplier {
        order.supplier = Some(supplier.clone());
    }
    if let Some(name) = &patch.customer_name {
        order.customer_name = name.clone();
    }
    if let Some(email) = &patch.customer_email {
        order.customer_email = Some(email.clone());
    }
    if let Some(phone) = &patch.customer_phone {
        order.customer_phone = Some(phone.clone());
    }
    if let Some(notify) = patch.notify_on_arrival {
        order.notify_on_arrival = notify;
    }
    if let Some(channel) = patch.notify_channel {
        order.notify_channel = channel;
    }
}

/// Classify an order mutation.
pub fn detect_order_changes(
    prior: &Order,
    current: &Order,
    patch: &OrderPatch,
) -> ChangeSet<OrderStatus> {
    let status = (current.status != prior.status).then_some(StatusChange {
        from: prior.status,
        to: current.status,
    });

    let mut fields = Vec::new();
    if patch.supplier.is_some() && current.supplier != prior.supplier {
        fields.push("supplier");
    }
    if patch.customer_name.is_some() && current.customer_name != prior.customer_name {
        fields.push("customer_name");
    }
    if patch.customer_email.is_some() && current.customer_email != prior.customer_email {
        fields.push("customer_email");
    }
    if patch.customer_phone.is_some() && current.customer_phone != prior.customer_phone {
        fields.push("customer_phone");
    }
    if patch.notify_on_arrival.is_some() && current.notify_on_arrival != prior.notify_on_arrival {
        fields.push("notify_on_arrival");
    }
    if patch.notify_channel.is_some() && current.notify_channel != prior.notify_channel {
        fields.push("notify_channel");
    }

    let terminal = status.and_then(|c| {
        matches!(c.to, OrderStatus::Arrived | OrderStatus::Completed).then_some(c.to)
    });

    ChangeSet {
        status,
        fields,
        terminal,
    }
}
