//! # FixHub Services
//! Lifecycle coordinators — the layer that decides *what else must happen*
//! when an entity mutates.
//!
//! Each service persists the primary mutation first, classifies it with the
//! change detector, then runs notifications and audit appends as isolated
//! best-effort side effects. A failed side effect is logged and never undoes
//! or blocks the mutation; only NotFound aborts an operation.

pub mod changes;
pub mod jobs;
pub mod orders;
pub mod parts;
pub mod staff;

#[cfg(test)]
pub(crate) mod testutil;

pub use changes::{ChangeSet, StatusChange};
pub use jobs::JobService;
pub use orders::OrderService;
pub use parts::PartService;
pub use staff::StaffNotifier;
