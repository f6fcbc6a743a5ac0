use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Account;

/// One account as persisted in the snapshot file.
///
/// The snapshot is a JSON array of these records. The shape is strict on
/// load: a missing field or a wrong type is a deserialization error, which
/// the snapshot store treats as a corrupt snapshot (fail-open to an empty
/// registry) rather than a crash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub username: String,
    pub pin: String,
    pub balance: Decimal,
    pub blocked: bool,
    pub history: Vec<String>,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        account.to_record()
    }
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account::from_record(record)
    }
}
