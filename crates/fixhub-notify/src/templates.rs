//! Notification templates — pure mapping from (kind, entity data) to
//! subject, plain-text body, and HTML body.
//!
//! All formatting lives here: minor-unit prices become display currency,
//! timestamps become locale strings, status codes become human labels.
//! Missing optional fields render a neutral placeholder, never an error.

use chrono::{DateTime, Utc};
use fixhub_core::types::{Job, Order, OrderItem, PartOnOrder};

/// What a notification is about; selects the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    JobBooked,
    JobReadyForPickup,
    PartReady,
    OrderPlaced,
    OrderArrived,
    WeeklyReport,
    Generic,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::JobBooked => "job_booked",
            NotificationKind::JobReadyForPickup => "job_ready_for_pickup",
            NotificationKind::PartReady => "part_ready",
            NotificationKind::OrderPlaced => "order_placed",
            NotificationKind::OrderArrived => "order_arrived",
            NotificationKind::WeeklyReport => "weekly_report",
            NotificationKind::Generic => "generic",
        }
    }
}

/// Rendered message content, shared by every transport in the chain.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Job counts for the weekly report template.
#[derive(Debug, Clone, Default)]
pub struct WeeklyReportStats {
    pub total_jobs: usize,
    pub waiting_assessment: usize,
    pub in_progress: usize,
    pub on_hold: usize,
    pub ready_for_pickup: usize,
    pub completed: usize,
    pub open_orders: usize,
}

/// Everything a template may draw on. Entity snapshots are optional; each
/// template reads only what it needs.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub business_id: &'a str,
    pub business_name: &'a str,
    pub recipient_name: Option<&'a str>,
    pub job: Option<&'a Job>,
    pub order: Option<&'a Order>,
    pub items: &'a [OrderItem],
    pub part: Option<&'a PartOnOrder>,
    pub report: Option<&'a WeeklyReportStats>,
    pub note: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    pub fn new(business_id: &'a str, business_name: &'a str) -> Self {
        Self {
            business_id,
            business_name,
            recipient_name: None,
            job: None,
            order: None,
            items: &[],
            part: None,
            report: None,
            note: None,
        }
    }

    pub fn recipient(mut self, name: Option<&'a str>) -> Self {
        self.recipient_name = name;
        self
    }

    pub fn job(mut self, job: &'a Job) -> Self {
        self.job = Some(job);
        self
    }

    pub fn order(mut self, order: &'a Order, items: &'a [OrderItem]) -> Self {
        self.order = Some(order);
        self.items = items;
        self
    }

    pub fn part(mut self, part: &'a PartOnOrder) -> Self {
        self.part = Some(part);
        self
    }

    pub fn report(mut self, report: &'a WeeklyReportStats) -> Self {
        self.report = Some(report);
        self
    }

    pub fn note(mut self, note: &'a str) -> Self {
        self.note = Some(note);
        self
    }

    /// Entity reference for the email history row, derived from whichever
    /// snapshot is present.
    pub fn entity_ref(&self) -> (Option<String>, Option<String>) {
        if let Some(job) = self.job {
            (Some("job".into()), Some(job.id.to_string()))
        } else if let Some(order) = self.order {
            (Some("order".into()), Some(order.id.to_string()))
        } else if let Some(part) = self.part {
            (Some("part".into()), Some(part.id.to_string()))
        } else {
            (None, None)
        }
    }
}

/// Render the template for `kind`.
pub fn render(kind: NotificationKind, ctx: &RenderContext<'_>) -> RenderedMessage {
    match kind {
        NotificationKind::JobBooked => render_job_booked(ctx),
        NotificationKind::JobReadyForPickup => render_job_ready(ctx),
        NotificationKind::PartReady => render_part_ready(ctx),
        NotificationKind::OrderPlaced => render_order_placed(ctx),
        NotificationKind::OrderArrived => render_order_arrived(ctx),
        NotificationKind::WeeklyReport => render_weekly_report(ctx),
        NotificationKind::Generic => render_generic(ctx),
    }
}

fn greeting(ctx: &RenderContext<'_>) -> String {
    match ctx.recipient_name {
        Some(name) if !name.is_empty() => format!("Hi {name},"),
        _ => "Hi,".into(),
    }
}

fn job_subject_desc(ctx: &RenderContext<'_>) -> String {
    ctx.job
        .map(|j| j.description.trim())
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| "your equipment".into())
}

fn render_job_booked(ctx: &RenderContext<'_>) -> RenderedMessage {
    let code = ctx.job.map(|j| j.code.as_str()).unwrap_or("—");
    let what = job_subject_desc(ctx);
    let subject = format!("{} — repair {} booked", ctx.business_name, code);
    let text = format!(
        "{}\n\nWe've booked in {} for repair.\n\nJob reference: {}\nCurrent status: {}\n\nWe'll let you know as soon as it's ready for pickup.\n\n{}",
        greeting(ctx),
        what,
        code,
        ctx.job.map(|j| j.status.label()).unwrap_or("Waiting Assessment"),
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p>We've booked in <strong>{}</strong> for repair.</p><p>Job reference: <strong>{}</strong><br>Current status: {}</p><p>We'll let you know as soon as it's ready for pickup.</p><p>{}</p>",
            greeting(ctx),
            what,
            code,
            ctx.job.map(|j| j.status.label()).unwrap_or("Waiting Assessment"),
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn render_job_ready(ctx: &RenderContext<'_>) -> RenderedMessage {
    let code = ctx.job.map(|j| j.code.as_str()).unwrap_or("—");
    let what = job_subject_desc(ctx);
    let subject = format!("{} — repair {} is ready for pickup", ctx.business_name, code);
    let text = format!(
        "{}\n\nGood news — {} is repaired and ready for pickup.\n\nJob reference: {}\n\nSee you soon,\n{}",
        greeting(ctx),
        what,
        code,
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p>Good news — <strong>{}</strong> is repaired and ready for pickup.</p><p>Job reference: <strong>{}</strong></p><p>See you soon,<br>{}</p>",
            greeting(ctx),
            what,
            code,
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn render_part_ready(ctx: &RenderContext<'_>) -> RenderedMessage {
    let part_name = ctx
        .part
        .map(|p| p.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or("your part");
    let subject = format!("{} — {} has arrived", ctx.business_name, part_name);
    let text = format!(
        "{}\n\n{} has arrived and is ready for collection.\n\n{}",
        greeting(ctx),
        part_name,
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p><strong>{}</strong> has arrived and is ready for collection.</p><p>{}</p>",
            greeting(ctx),
            part_name,
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn items_text(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|i| {
            format!(
                "  {} x {} — {}",
                i.quantity,
                i.name,
                format_money(i.unit_price_cents * i.quantity as i64)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn items_html(items: &[OrderItem]) -> String {
    let rows: String = items
        .iter()
        .map(|i| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                i.name,
                i.quantity,
                format_money(i.unit_price_cents * i.quantity as i64)
            )
        })
        .collect();
    format!(
        "<table><tr><th>Item</th><th>Qty</th><th>Price</th></tr>{rows}</table>"
    )
}

fn order_total(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .map(|i| i.unit_price_cents * i.quantity as i64)
        .sum()
}

fn render_order_placed(ctx: &RenderContext<'_>) -> RenderedMessage {
    let number = ctx.order.map(|o| o.order_number.as_str()).unwrap_or("—");
    let subject = format!("{} — order {} placed", ctx.business_name, number);
    let text = format!(
        "{}\n\nWe've placed your order {}.\n\n{}\n\nTotal: {}\n\nWe'll be in touch when it arrives.\n\n{}",
        greeting(ctx),
        number,
        items_text(ctx.items),
        format_money(order_total(ctx.items)),
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p>We've placed your order <strong>{}</strong>.</p>{}<p>Total: <strong>{}</strong></p><p>We'll be in touch when it arrives.</p><p>{}</p>",
            greeting(ctx),
            number,
            items_html(ctx.items),
            format_money(order_total(ctx.items)),
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn render_order_arrived(ctx: &RenderContext<'_>) -> RenderedMessage {
    let number = ctx.order.map(|o| o.order_number.as_str()).unwrap_or("—");
    let subject = format!("{} — order {} has arrived", ctx.business_name, number);
    let text = format!(
        "{}\n\nYour order {} has arrived and is ready for collection.\n\n{}\n\n{}",
        greeting(ctx),
        number,
        items_text(ctx.items),
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p>Your order <strong>{}</strong> has arrived and is ready for collection.</p>{}<p>{}</p>",
            greeting(ctx),
            number,
            items_html(ctx.items),
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn render_weekly_report(ctx: &RenderContext<'_>) -> RenderedMessage {
    let stats = ctx.report.cloned().unwrap_or_default();
    let subject = format!("Weekly job report — {}", ctx.business_name);
    let text = format!(
        "{}\n\nHere's where the workshop stands this week:\n\n  Open jobs: {}\n  Waiting assessment: {}\n  In progress: {}\n  On hold: {}\n  Ready for pickup: {}\n  Completed: {}\n  Open parts orders: {}\n\n{}",
        greeting(ctx),
        stats.total_jobs,
        stats.waiting_assessment,
        stats.in_progress,
        stats.on_hold,
        stats.ready_for_pickup,
        stats.completed,
        stats.open_orders,
        ctx.business_name,
    );
    let html = wrap_html(
        &subject,
        &format!(
            "<p>{}</p><p>Here's where the workshop stands this week:</p><table><tr><td>Open jobs</td><td>{}</td></tr><tr><td>Waiting assessment</td><td>{}</td></tr><tr><td>In progress</td><td>{}</td></tr><tr><td>On hold</td><td>{}</td></tr><tr><td>Ready for pickup</td><td>{}</td></tr><tr><td>Completed</td><td>{}</td></tr><tr><td>Open parts orders</td><td>{}</td></tr></table><p>{}</p>",
            greeting(ctx),
            stats.total_jobs,
            stats.waiting_assessment,
            stats.in_progress,
            stats.on_hold,
            stats.ready_for_pickup,
            stats.completed,
            stats.open_orders,
            ctx.business_name,
        ),
    );
    RenderedMessage { subject, text, html }
}

fn render_generic(ctx: &RenderContext<'_>) -> RenderedMessage {
    let note = ctx.note.unwrap_or_default();
    let subject = format!("Message from {}", ctx.business_name);
    let text = format!("{}\n\n{}\n\n{}", greeting(ctx), note, ctx.business_name);
    let html = wrap_html(
        &subject,
        &format!("<p>{}</p><p>{}</p><p>{}</p>", greeting(ctx), note, ctx.business_name),
    );
    RenderedMessage { subject, text, html }
}

fn wrap_html(title: &str, body: &str) -> String {
    format!("<html><body><h2>{title}</h2>{body}</body></html>")
}

/// Minor units to display currency: 1234 → `$12.34`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Locale-formatted date for notification bodies: `05 Aug 2026`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fixhub_core::types::{JobStatus, NotifyChannelPref, OrderStatus};

    fn sample_job() -> Job {
        Job {
            id: 4,
            business_id: "biz-1".into(),
            code: "J-004".into(),
            status: JobStatus::WaitingAssessment,
            customer_id: None,
            customer_name: Some("Sam".into()),
            customer_email: Some("sam@example.com".into()),
            customer_phone: None,
            assignee_id: None,
            description: "Stihl chainsaw".into(),
            estimated_hours: Some(1.5),
            actual_hours: None,
            customer_notified: false,
            created_at: Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
        }
    }

    fn sample_order() -> (Order, Vec<OrderItem>) {
        let order = Order {
            id: 9,
            business_id: "biz-1".into(),
            order_number: "ORD-20260805-0001".into(),
            status: OrderStatus::Ordered,
            supplier: None,
            customer_name: "Alex".into(),
            customer_email: Some("a@example.com".into()),
            customer_phone: None,
            notify_on_placed: true,
            notify_on_arrival: false,
            notify_channel: NotifyChannelPref::Email,
            job_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
        };
        let items = vec![OrderItem {
            id: 1,
            order_id: 9,
            name: "Blade".into(),
            sku: Some("BL-16".into()),
            quantity: 2,
            unit_price_cents: 550,
        }];
        (order, items)
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234), "$12.34");
        assert_eq!(format_money(5), "$0.05");
        assert_eq!(format_money(-250), "-$2.50");
    }

    #[test]
    fn test_format_date() {
        let at = Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap();
        assert_eq!(format_date(at), "05 Aug 2026");
    }

    #[test]
    fn test_job_booked_includes_code_and_description() {
        let job = sample_job();
        let ctx = RenderContext::new("biz-1", "North Shore Repairs")
            .recipient(Some("Sam"))
            .job(&job);
        let msg = render(NotificationKind::JobBooked, &ctx);
        assert!(msg.subject.contains("J-004"));
        assert!(msg.text.contains("Stihl chainsaw"));
        assert!(msg.text.contains("Hi Sam,"));
        assert!(msg.html.contains("<strong>J-004</strong>"));
    }

    #[test]
    fn test_missing_description_uses_placeholder() {
        let mut job = sample_job();
        job.description = String::new();
        let ctx = RenderContext::new("biz-1", "North Shore Repairs").job(&job);
        let msg = render(NotificationKind::JobReadyForPickup, &ctx);
        assert!(msg.text.contains("your equipment"));
    }

    #[test]
    fn test_order_placed_lists_items_and_total() {
        let (order, items) = sample_order();
        let ctx = RenderContext::new("biz-1", "North Shore Repairs")
            .recipient(Some("Alex"))
            .order(&order, &items);
        let msg = render(NotificationKind::OrderPlaced, &ctx);
        assert!(msg.subject.contains("ORD-20260805-0001"));
        assert!(msg.text.contains("Blade"));
        assert!(msg.text.contains("2 x Blade"));
        assert!(msg.text.contains("$11.00"));
        assert!(msg.html.contains("<td>Blade</td>"));
    }

    #[test]
    fn test_weekly_report_counts() {
        let stats = WeeklyReportStats {
            total_jobs: 7,
            waiting_assessment: 2,
            in_progress: 3,
            on_hold: 1,
            ready_for_pickup: 1,
            completed: 12,
            open_orders: 4,
        };
        let ctx = RenderContext::new("biz-1", "North Shore Repairs").report(&stats);
        let msg = render(NotificationKind::WeeklyReport, &ctx);
        assert!(msg.subject.contains("North Shore Repairs"));
        assert!(msg.text.contains("Open jobs: 7"));
        assert!(msg.text.contains("Ready for pickup: 1"));
    }

    #[test]
    fn test_entity_ref_derivation() {
        let job = sample_job();
        let ctx = RenderContext::new("biz-1", "Shop").job(&job);
        assert_eq!(
            ctx.entity_ref(),
            (Some("job".into()), Some("4".into()))
        );
        let empty = RenderContext::new("biz-1", "Shop");
        assert_eq!(empty.entity_ref(), (None, None));
    }
}
