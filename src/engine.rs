//! The engine facade consumed by the presentation layer.
//!
//! [`Bank`] owns the registry and the snapshot store, hands out
//! authenticated [`Session`]s, and flushes the full registry after every
//! successful mutation so state survives a restart.

use std::path::PathBuf;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::stores::{AccountRegistry, SnapshotStore, ADMIN_USERNAME};
use crate::{Account, Error};

/// Capability level resulting from a successful credential match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Admin,
    User,
}

/// An authenticated handle onto one account. Holding a session proves the
/// caller passed the credential check; account operations go through
/// [`Bank`] so every mutation is followed by a flush.
#[derive(Debug)]
pub struct Session {
    account: Arc<Account>,
    role: SessionRole,
}

impl Session {
    pub fn username(&self) -> &str {
        self.account.username()
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == SessionRole::Admin
    }
}

pub struct Bank {
    registry: AccountRegistry,
    store: SnapshotStore,
}

impl Bank {
    /// Loads the snapshot at `path` (or starts empty per the store's
    /// fail-open policy) and guarantees the administrative account exists,
    /// persisting immediately if it had to be created.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = SnapshotStore::new(path);
        let registry = store.load();
        if registry.ensure_admin() {
            store.save(&registry);
        }
        Self { registry, store }
    }

    pub fn register_account(&self, username: &str, pin: &str) -> Result<(), Error> {
        self.registry.register(username, pin)?;
        self.flush();
        Ok(())
    }

    /// Resolves credentials to a session role. Credentials are checked
    /// before the blocked flag, so a mismatched PIN never reveals block
    /// status; a blocked account with matching credentials is reported as
    /// [`Error::AccountBlocked`]. The well-known admin username yields an
    /// admin session and is exempt from the block check.
    pub fn authenticate(&self, username: &str, pin: &str) -> Result<Session, Error> {
        let account = self.registry.authenticate(username, pin)?;
        if account.username() == ADMIN_USERNAME {
            return Ok(Session {
                account,
                role: SessionRole::Admin,
            });
        }
        if account.is_blocked() {
            return Err(Error::AccountBlocked);
        }
        Ok(Session {
            account,
            role: SessionRole::User,
        })
    }

    pub fn deposit(&self, session: &Session, amount: Decimal) -> Result<Decimal, Error> {
        let balance = session.account.deposit(amount)?;
        self.flush();
        Ok(balance)
    }

    pub fn withdraw(&self, session: &Session, amount: Decimal) -> Result<Decimal, Error> {
        let balance = session.account.withdraw(amount)?;
        self.flush();
        Ok(balance)
    }

    pub fn balance(&self, session: &Session) -> Decimal {
        session.account.balance()
    }

    pub fn history(&self, session: &Session) -> Vec<String> {
        session.account.history()
    }

    pub fn change_pin(&self, session: &Session, old: &str, new: &str) -> Result<(), Error> {
        session.account.change_pin(old, new)?;
        self.flush();
        Ok(())
    }

    /// Self-service deletion. The PIN is re-verified even though the caller
    /// already holds a session, and the session is consumed so the handle
    /// cannot outlive the account. The administrative account is never
    /// deletable (exactly one must exist at all times).
    pub fn delete_own_account(&self, session: Session, pin: &str) -> Result<(), Error> {
        if session.is_admin() {
            return Err(Error::NotFound);
        }
        if !session.account.validate_pin(pin) {
            return Err(Error::InvalidCredentials);
        }
        self.registry.remove(session.account.username());
        self.flush();
        Ok(())
    }

    /// `(username, blocked)` pairs for the admin view; never contains the
    /// administrative account.
    pub fn list_users(&self) -> Vec<(String, bool)> {
        self.registry.list()
    }

    /// Flips the target's block flag and returns the new state.
    pub fn toggle_block(&self, username: &str) -> Result<bool, Error> {
        let blocked = self.admin_target(username)?.toggle_block();
        self.flush();
        Ok(blocked)
    }

    pub fn delete_user(&self, username: &str) -> Result<(), Error> {
        self.admin_target(username)?;
        self.registry.remove(username);
        self.flush();
        Ok(())
    }

    pub fn view_user_history(&self, username: &str) -> Result<Vec<String>, Error> {
        Ok(self.admin_target(username)?.history())
    }

    /// Resolves a username for an administrative action. The administrative
    /// account is not a valid target: it reports as absent, matching its
    /// exclusion from `list_users`.
    fn admin_target(&self, username: &str) -> Result<Arc<Account>, Error> {
        if username == ADMIN_USERNAME {
            return Err(Error::NotFound);
        }
        self.registry.get(username).ok_or(Error::NotFound)
    }

    /// Persists the current state as one full-registry snapshot. Infallible
    /// by contract: failures are absorbed by the store and visible only via
    /// [`Bank::last_persistence_error`].
    pub fn flush(&self) {
        self.store.save(&self.registry);
    }

    /// Cause of the most recent failed load/save, if the latest one failed.
    pub fn last_persistence_error(&self) -> Option<String> {
        self.store.last_error()
    }
}
