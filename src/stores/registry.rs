use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::account::{valid_pin, valid_username, Account};
use crate::Error;

/// Well-known username of the administrative account, created lazily on
/// first startup.
pub const ADMIN_USERNAME: &str = "admin";

/// Seed PIN for the administrative account. This is a first-login default
/// inherited from the original deployment, not a security property; it is
/// expected to be changed via `change_pin`.
pub const ADMIN_SEED_PIN: &str = "0000";

/// The full set of accounts, keyed by username.
///
/// The map lock covers structural changes only (insert/remove of keys);
/// account state is mutated under each account's own lock, so operations on
/// one account never block operations on another.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Arc<Account>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from loaded accounts. Duplicate usernames cannot
    /// occur here since the snapshot is itself keyed by username.
    pub(crate) fn from_accounts(iter: impl IntoIterator<Item = Account>) -> Self {
        let accounts = iter
            .into_iter()
            .map(|account| (account.username().to_owned(), Arc::new(account)))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// Validates the username and PIN shape, then creates and inserts a new
    /// account. The uniqueness check and the insert happen under one write
    /// lock, so two racing registrations of the same name cannot both win.
    pub fn register(&self, username: &str, pin: &str) -> Result<Arc<Account>, Error> {
        if !valid_username(username) {
            return Err(Error::InvalidUsername);
        }
        if !valid_pin(pin) {
            return Err(Error::InvalidPin);
        }
        let mut accounts = self.accounts.write();
        if accounts.contains_key(username) {
            return Err(Error::DuplicateUser);
        }
        let account = Arc::new(Account::new(username, pin));
        accounts.insert(username.to_owned(), Arc::clone(&account));
        Ok(account)
    }

    /// Resolves a username and checks the PIN. Does NOT check the blocked
    /// flag: callers consult block status only after a successful credential
    /// match, so mismatched credentials never reveal whether an account is
    /// blocked.
    pub fn authenticate(&self, username: &str, pin: &str) -> Result<Arc<Account>, Error> {
        let account = self.get(username).ok_or(Error::NotFound)?;
        if !account.validate_pin(pin) {
            return Err(Error::InvalidCredentials);
        }
        Ok(account)
    }

    pub fn get(&self, username: &str) -> Option<Arc<Account>> {
        self.accounts.read().get(username).cloned()
    }

    /// Removes an account. Idempotent: removing an absent username is a
    /// no-op.
    pub fn remove(&self, username: &str) {
        self.accounts.write().remove(username);
    }

    /// `(username, blocked)` pairs for administrative display, sorted by
    /// username for stable iteration. The administrative account is excluded
    /// so it can never be targeted by its own block/delete actions.
    pub fn list(&self) -> Vec<(String, bool)> {
        let mut rows: Vec<_> = self
            .accounts
            .read()
            .iter()
            .filter(|(username, _)| username.as_str() != ADMIN_USERNAME)
            .map(|(username, account)| (username.clone(), account.is_blocked()))
            .collect();
        rows.sort();
        rows
    }

    /// Creates the administrative account with the seed PIN if it is absent.
    /// Returns whether it had to be created (so the caller knows to flush).
    pub fn ensure_admin(&self) -> bool {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(ADMIN_USERNAME) {
            return false;
        }
        accounts.insert(
            ADMIN_USERNAME.to_owned(),
            Arc::new(Account::new(ADMIN_USERNAME, ADMIN_SEED_PIN)),
        );
        true
    }

    /// Clones out the account handles for persistence. The read lock is
    /// held only while cloning the `Arc`s, never during serialization.
    pub(crate) fn handles(&self) -> Vec<Arc<Account>> {
        self.accounts.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}
