//! # FixHub Core
//! Shared types, configuration, errors, and trait seams.
//!
//! Everything above this crate (transports, notify, audit, services,
//! scheduler, stores) depends on it; it depends on nothing internal.

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{FixHubError, Result, SideEffectError};
