//! Storage layer for the account engine. Provides storage for:
//! - The in-memory account set keyed by username ([`AccountRegistry`])
//! - The durable whole-registry snapshot ([`SnapshotStore`])
//!
//! The registry covers structural changes (insert/remove of usernames)
//! under its own lock; value mutation is covered by the per-account locks.

mod registry;
mod snapshot;

pub use registry::{AccountRegistry, ADMIN_SEED_PIN, ADMIN_USERNAME};
pub use snapshot::SnapshotStore;
