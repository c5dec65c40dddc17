//! Error taxonomy for the FixHub workspace.
//!
//! Only `NotFound` and `Validation` are allowed to abort a mutation and
//! surface to the caller. Everything that happens *after* the primary
//! persistence write (notifications, audit appends, dependent lookups) is a
//! best-effort side effect and travels as [`SideEffectError`] so coordinators
//! can log it and move on.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FixHubError>;

/// Top-level error for all FixHub crates.
#[derive(Error, Debug)]
pub enum FixHubError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("store: {0}")]
    Store(String),

    #[error("transport: {0}")]
    Transport(String),

    #[error("config: {0}")]
    Config(String),

    #[error("scheduler: {0}")]
    Scheduler(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl FixHubError {
    /// Shorthand for a NotFound describing an entity by kind and id.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}

/// Failure of a best-effort side effect.
///
/// Never converted into [`FixHubError`]: the triggering mutation has already
/// succeeded by the time one of these can occur, and its result must not be
/// affected. Callers log these and continue.
#[derive(Error, Debug)]
pub enum SideEffectError {
    #[error("notification: {0}")]
    Notification(String),

    #[error("audit: {0}")]
    Audit(String),

    #[error("lookup: {0}")]
    Lookup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = FixHubError::not_found("job", 42);
        assert_eq!(err.to_string(), "not found: job 42");
    }

    #[test]
    fn test_side_effect_display() {
        let err = SideEffectError::Notification("smtp unreachable".into());
        assert_eq!(err.to_string(), "notification: smtp unreachable");
    }
}
