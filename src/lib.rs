mod account;
mod dto;
mod engine;
mod error;
mod stores;

pub use account::{valid_pin, valid_username, Account, HISTORY_LIMIT};
pub use dto::AccountRecord;
pub use engine::{Bank, Session, SessionRole};
pub use error::Error;
pub use stores::{AccountRegistry, SnapshotStore, ADMIN_SEED_PIN, ADMIN_USERNAME};
