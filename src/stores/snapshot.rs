//! Durable whole-registry snapshots.
//!
//! The entire registry is serialized to one JSON file per save; there is no
//! incremental log, so save cost is linear in the account count (fine at
//! the expected scale of tens of accounts).
//!
//! Both directions are fail-open: a missing, unreadable or mismatched
//! snapshot loads as an empty registry, and save errors are logged and
//! recorded but never returned. Callers that need to observe persistence
//! health poll [`SnapshotStore::last_error`].

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::dto::AccountRecord;
use crate::stores::registry::AccountRegistry;
use crate::Account;

pub struct SnapshotStore {
    path: PathBuf,
    /// Cause of the most recent failed load/save, cleared on the next
    /// successful one. The fail-open policy's only observable surface.
    last_error: Mutex<Option<String>>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_error: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot into a fresh registry. Any failure (missing file,
    /// unreadable bytes, malformed JSON, schema mismatch, invariant-breaking
    /// data) yields an empty registry instead of an error: availability is
    /// chosen over strict durability, at the documented cost that a corrupt
    /// snapshot silently discards all accounts.
    pub fn load(&self) -> AccountRegistry {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot on disk, starting empty");
            *self.last_error.lock() = None;
            return AccountRegistry::new();
        }
        match self.try_load() {
            Ok(registry) => {
                debug!(
                    path = %self.path.display(),
                    accounts = registry.len(),
                    "snapshot loaded"
                );
                *self.last_error.lock() = None;
                registry
            }
            Err(reason) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "discarding unreadable snapshot, starting empty"
                );
                *self.last_error.lock() = Some(reason);
                AccountRegistry::new()
            }
        }
    }

    fn try_load(&self) -> Result<AccountRegistry, String> {
        let bytes = fs::read(&self.path).map_err(|e| e.to_string())?;
        let records: Vec<AccountRecord> =
            serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
        // A negative balance can only come from outside mutation of the
        // file; treat it like any other corruption.
        if records.iter().any(|record| record.balance < Decimal::ZERO) {
            return Err("snapshot contains a negative balance".to_owned());
        }
        Ok(AccountRegistry::from_accounts(
            records.into_iter().map(Account::from),
        ))
    }

    /// Writes the whole registry as one snapshot, replacing the previous
    /// file. Errors are swallowed: logged, recorded in `last_error`, never
    /// returned, so callers cannot assume a failed save is observable.
    pub fn save(&self, registry: &AccountRegistry) {
        match self.try_save(registry) {
            Ok(count) => {
                debug!(path = %self.path.display(), accounts = count, "snapshot saved");
                *self.last_error.lock() = None;
            }
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "snapshot save failed");
                *self.last_error.lock() = Some(reason);
            }
        }
    }

    fn try_save(&self, registry: &AccountRegistry) -> Result<usize, String> {
        // Each record is a consistent copy taken under that account's own
        // lock, one account at a time; no lock is held across the I/O below.
        let records: Vec<AccountRecord> = registry
            .handles()
            .iter()
            .map(|account| AccountRecord::from(account.as_ref()))
            .collect();
        let json = serde_json::to_vec_pretty(&records).map_err(|e| e.to_string())?;

        // Write to a sibling temp file and rename over the target. Rename is
        // atomic within one filesystem, so a crash mid-save leaves either
        // the old snapshot or the new one, never a torn file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json).map_err(|e| e.to_string())?;
        fs::rename(&tmp, &self.path).map_err(|e| e.to_string())?;
        Ok(records.len())
    }

    /// Cause of the most recent failed load/save, if the latest one failed.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
