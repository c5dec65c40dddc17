//! # FixHub Scheduler
//!
//! In-process recurring tasks without an external scheduler: each named task
//! computes its next fire time from a fixed rule, sleeps, runs, then re-arms
//! on a fixed period. Timers live only in process memory — a restart
//! recomputes everything from the wall clock.
//!
//! ```text
//! SchedulerRegistry (name → handle, owned by the process lifetime object)
//!   ├── "weekly-report": Weekly(mon 09:00) → one report email per tenant
//!   └── "daily-cleanup": Daily(02:00)     → activity retention delete
//! ```

pub mod registry;
pub mod rules;
pub mod tasks;

pub use registry::{SchedulerRegistry, TaskRunner};
pub use rules::ScheduleRule;
pub use tasks::{DailyCleanupTask, WeeklyReportTask};
