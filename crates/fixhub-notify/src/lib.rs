//! # FixHub Notify
//! Content templating and best-effort notification dispatch.
//!
//! `templates` maps a notification kind plus entity snapshots to rendered
//! subject/text/html; `dispatcher` walks a static per-channel fallback chain
//! of transport adapters built once at startup. Dispatch is single-attempt,
//! no retry, no queue — failures surface only as a `false` outcome and an
//! email-history row.

pub mod dispatcher;
pub mod templates;

pub use dispatcher::{NotificationDispatcher, Recipient};
pub use templates::{NotificationKind, RenderContext, RenderedMessage, WeeklyReportStats};
