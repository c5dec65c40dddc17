//! # FixHub Store
//! Concrete implementations of the core store traits.
//!
//! `memory` holds everything in process memory behind a tokio `RwLock` —
//! the backing for tests, the demo binary, and any embedder that brings its
//! own durable persistence behind the same traits. `sqlite` is the embedded
//! append-only sink for audit and email history.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteAuditLog;
