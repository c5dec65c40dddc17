//! Order lifecycle coordinator.
//!
//! Mirrors the job coordinator with its own status vocabulary plus two extra
//! concerns: per-tenant-per-day order numbers and a staff in-app fan-out on
//! placement/arrival.

use std::sync::Arc;

use serde_json::json;

use fixhub_audit::ActivityLogger;
use fixhub_core::clock::Clock;
use fixhub_core::error::{FixHubError, Result};
use fixhub_core::traits::{Directory, OrderStore};
use fixhub_core::types::{
    NewOrder, NotifyPriority, Order, OrderItem, OrderPatch, OrderStatus,
};
use fixhub_notify::{NotificationDispatcher, NotificationKind, Recipient, RenderContext};

use crate::changes;
use crate::jobs::JobService;
use crate::staff::StaffNotifier;

/// Order lifecycle coordinator.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    directory: Arc<dyn Directory>,
    dispatcher: Arc<NotificationDispatcher>,
    staff: StaffNotifier,
    activity: ActivityLogger,
    jobs: Arc<JobService>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        directory: Arc<dyn Directory>,
        dispatcher: Arc<NotificationDispatcher>,
        staff: StaffNotifier,
        activity: ActivityLogger,
        jobs: Arc<JobService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            directory,
            dispatcher,
            staff,
            activity,
            jobs,
            clock,
        }
    }

    /// Next order number for the tenant-day: `ORD-YYYYMMDD-NNNN`, computed by
    /// scanning today's orders for the highest suffix.
    ///
    /// Unlocked read-then-write: two concurrent creations for the same
    /// tenant-day can compute the same suffix. Accepted limitation — serial
    /// calls are guaranteed distinct, concurrent ones are not.
    pub async fn generate_order_number(&self, business_id: &str) -> Result<String> {
        let today = self.clock.now().format("%Y%m%d");
        let prefix = format!("ORD-{today}-");
        let orders = self.orders.find_all(business_id).await?;
        let max = orders
            .iter()
            .filter_map(|o| o.order_number.strip_prefix(&prefix))
            .filter_map(|s| s.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("{prefix}{:04}", max + 1))
    }

    /// Create an order with its items. Placement notification fires when the
    /// stored `notify_on_placed` preference is set and a customer email
    /// exists; staff get one in-app record each regardless.
    pub async fn create(
        &self,
        business_id: &str,
        new: NewOrder,
        actor_id: Option<i64>,
    ) -> Result<Order> {
        let now = self.clock.now();
        let order_number = self.generate_order_number(business_id).await?;
        let order = Order {
            id: 0,
            business_id: business_id.to_string(),
            order_number,
            status: OrderStatus::Ordered,
            supplier: new.supplier,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            notify_on_placed: new.notify_on_placed,
            notify_on_arrival: new.notify_on_arrival,
            notify_channel: new.notify_channel,
            job_id: new.job_id,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = new
            .items
            .into_iter()
            .map(|i| OrderItem {
                id: 0,
                order_id: 0,
                name: i.name,
                sku: i.sku,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
            })
            .collect();

        let order = self.orders.create(order, items).await?;
        let items = self.orders.items(order.id).await.unwrap_or_default();
        tracing::info!(
            "📦 Order {} created for {business_id} ({} item(s))",
            order.order_number,
            items.len()
        );

        if order.notify_on_placed && order.customer_email.is_some() {
            let delivered = self
                .notify(NotificationKind::OrderPlaced, &order, &items)
                .await;
            if !delivered {
                tracing::warn!(
                    "⚠️ Placed notification for {} not delivered",
                    order.order_number
                );
            }
        }

        match self
            .staff
            .notify_staff(
                business_id,
                "order_placed",
                &format!("New order {}", order.order_number),
                &format!("{} for {}", order.order_number, order.customer_name),
                Some(format!("/orders/{}", order.id)),
                NotifyPriority::Normal,
            )
            .await
        {
            Ok(written) => tracing::debug!("Notified {written} staff of {}", order.order_number),
            Err(e) => tracing::warn!("⚠️ Staff fan-out for {} failed: {e}", order.order_number),
        }

        self.activity
            .log(
                business_id,
                actor_id,
                "order_created",
                "order",
                &order.id.to_string(),
                json!({"code": order.order_number}),
            )
            .await;

        self.touch_linked_job(&order).await;
        Ok(order)
    }

    /// Move an order to `status`. The arrival notification fires only when
    /// the caller passes `notify_now` — an explicit per-call override,
    /// deliberately decoupled from the stored `notify_on_arrival` default.
    pub async fn set_status(
        &self,
        business_id: &str,
        id: i64,
        status: OrderStatus,
        notify_now: bool,
        actor_id: Option<i64>,
    ) -> Result<Order> {
        let prior = self
            .orders
            .find_by_id(business_id, id)
            .await?
            .ok_or_else(|| FixHubError::not_found("order", id))?;

        let patch = OrderPatch {
            status: Some(status),
            ..Default::default()
        };
        let mut order = prior.clone();
        changes::apply_order_patch(&mut order, &patch);
        order.updated_at = self.clock.now();
        let order = self.orders.update(&order).await?;

        let changes = changes::detect_order_changes(&prior, &order, &patch);

        if let Some(change) = changes.status {
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "order_status_changed",
                    "order",
                    &order.id.to_string(),
                    json!({
                        "code": order.order_number,
                        "from": change.from.label(),
                        "to": change.to.label(),
                    }),
                )
                .await;

            if change.to == OrderStatus::Completed {
                self.activity
                    .log(
                        business_id,
                        actor_id,
                        "order_completed",
                        "order",
                        &order.id.to_string(),
                        json!({"code": order.order_number}),
                    )
                    .await;
            }
        }

        if changes.terminal == Some(OrderStatus::Arrived) {
            if notify_now {
                let items = self.orders.items(order.id).await.unwrap_or_default();
                let delivered = self
                    .notify(NotificationKind::OrderArrived, &order, &items)
                    .await;
                if !delivered {
                    tracing::warn!(
                        "⚠️ Arrival notification for {} not delivered",
                        order.order_number
                    );
                }
            }

            if let Err(e) = self
                .staff
                .notify_staff(
                    business_id,
                    "order_arrived",
                    &format!("Order {} arrived", order.order_number),
                    &format!("{} for {}", order.order_number, order.customer_name),
                    Some(format!("/orders/{}", order.id)),
                    NotifyPriority::Normal,
                )
                .await
            {
                tracing::warn!("⚠️ Staff fan-out for {} failed: {e}", order.order_number);
            }
        }

        self.touch_linked_job(&order).await;
        Ok(order)
    }

    /// Apply a partial field update (non-status). One `order_updated` entry
    /// listing the changed field names, never one per field.
    pub async fn update(
        &self,
        business_id: &str,
        id: i64,
        patch: OrderPatch,
        actor_id: Option<i64>,
    ) -> Result<Order> {
        let prior = self
            .orders
            .find_by_id(business_id, id)
            .await?
            .ok_or_else(|| FixHubError::not_found("order", id))?;

        let mut order = prior.clone();
        changes::apply_order_patch(&mut order, &patch);
        order.updated_at = self.clock.now();
        let order = self.orders.update(&order).await?;

        let changes = changes::detect_order_changes(&prior, &order, &patch);
        if let Some(change) = changes.status {
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "order_status_changed",
                    "order",
                    &order.id.to_string(),
                    json!({
                        "code": order.order_number,
                        "from": change.from.label(),
                        "to": change.to.label(),
                    }),
                )
                .await;
        }
        if !changes.fields.is_empty() {
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "order_updated",
                    "order",
                    &order.id.to_string(),
                    json!({"code": order.order_number, "fields": changes.fields}),
                )
                .await;
        }

        self.touch_linked_job(&order).await;
        Ok(order)
    }

    /// Delete an order, cascading its items.
    pub async fn delete(
        &self,
        business_id: &str,
        id: i64,
        actor_id: Option<i64>,
    ) -> Result<bool> {
        let prior = match self.orders.find_by_id(business_id, id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("⚠️ Pre-delete fetch of order {id} failed: {e}");
                None
            }
        };

        let found = self.orders.delete(business_id, id).await?;
        if found {
            let code = prior
                .map(|o| o.order_number)
                .unwrap_or_else(|| id.to_string());
            self.activity
                .log(
                    business_id,
                    actor_id,
                    "order_deleted",
                    "order",
                    &id.to_string(),
                    json!({"code": code}),
                )
                .await;
        }
        Ok(found)
    }

    /// Open (not yet completed) orders, for the weekly report.
    pub async fn open_count(&self, business_id: &str) -> Result<usize> {
        let orders = self.orders.find_all(business_id).await?;
        Ok(orders
            .iter()
            .filter(|o| o.status != OrderStatus::Completed)
            .count())
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

    async fn notify(&self, kind: NotificationKind, order: &Order, items: &[OrderItem]) -> bool {
        let business_name = self.business_name(&order.business_id).await;
        let ctx = RenderContext::new(&order.business_id, &business_name)
            .recipient(Some(order.customer_name.as_str()))
            .order(order, items);
        let recipient = Recipient {
            name: Some(order.customer_name.clone()),
            email: order.customer_email.clone(),
            phone: order.customer_phone.clone(),
            channel: order.notify_channel,
        };
        self.dispatcher.send_notification(kind, &recipient, &ctx).await
    }

    async fn touch_linked_job(&self, order: &Order) {
        if let Some(job_id) = order.job_id {
            if let Err(e) = self.jobs.touch(&order.business_id, job_id).await {
                tracing::warn!(
                    "⚠️ Touch of job {job_id} linked to {} failed: {e}",
                    order.order_number
                );
            }
        }
    }
}
