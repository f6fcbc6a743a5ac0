//! The account entity: one holder's identity, PIN, balance, block flag
//! and bounded history, behind a per-instance lock.

use std::collections::VecDeque;

use chrono::Local;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::dto::AccountRecord;
use crate::Error;

/// Maximum number of history lines kept per account; the oldest line is
/// evicted first once the cap is reached.
pub const HISTORY_LIMIT: usize = 30;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Username rule: 3-12 characters, letters, digits or underscore.
pub fn valid_username(username: &str) -> bool {
    (3..=12).contains(&username.len())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// PIN rule: 4-6 ASCII digits.
pub fn valid_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug)]
struct AccountState {
    pin: String,
    balance: Decimal,
    blocked: bool,
    history: VecDeque<String>,
}

impl AccountState {
    /// Appends a timestamped history line, truncating to [`HISTORY_LIMIT`].
    fn push_history(&mut self, desc: &str) {
        let ts = Local::now().format(TIMESTAMP_FORMAT);
        self.history.push_back(format!("{ts} - {desc}"));
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}

/// A single holder's financial state.
///
/// The account is a monitor: every public operation acquires the embedded
/// lock, so mutations on one account are strictly serialized and reads never
/// observe a half-updated state. Distinct accounts lock independently and
/// never contend with each other. No operation performs I/O while holding
/// the lock.
#[derive(Debug)]
pub struct Account {
    username: String,
    state: Mutex<AccountState>,
}

impl Account {
    /// Creates an account with a zero balance and a synthetic "created"
    /// history line.
    pub fn new(username: impl Into<String>, pin: impl Into<String>) -> Self {
        let mut state = AccountState {
            pin: pin.into(),
            balance: Decimal::ZERO,
            blocked: false,
            history: VecDeque::new(),
        };
        state.push_history("Account created. Initial balance: 0");
        Self {
            username: username.into(),
            state: Mutex::new(state),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Equality check against the stored PIN. No side effect, no history
    /// line, safe to call repeatedly and on blocked accounts (callers check
    /// the block flag separately).
    pub fn validate_pin(&self, input: &str) -> bool {
        self.state.lock().pin == input
    }

    pub fn balance(&self) -> Decimal {
        self.state.lock().balance
    }

    pub fn is_blocked(&self) -> bool {
        self.state.lock().blocked
    }

    /// Adds `amount` to the balance and logs it. Returns the new balance.
    /// Fails without mutation when `amount <= 0`.
    pub fn deposit(&self, amount: Decimal) -> Result<Decimal, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount);
        }
        let mut state = self.state.lock();
        state.balance += amount;
        let balance = state.balance;
        state.push_history(&format!("Deposited {amount}. Balance: {balance}"));
        Ok(balance)
    }

    /// Subtracts `amount` from the balance and logs it. Returns the new
    /// balance. Fails without mutation when `amount <= 0` or the balance
    /// would go negative.
    pub fn withdraw(&self, amount: Decimal) -> Result<Decimal, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount);
        }
        let mut state = self.state.lock();
        if amount > state.balance {
            return Err(Error::InsufficientFunds);
        }
        state.balance -= amount;
        let balance = state.balance;
        state.push_history(&format!("Withdrew {amount}. Balance: {balance}"));
        Ok(balance)
    }

    /// Replaces the PIN. The old PIN is verified first, so a wrong `old`
    /// fails regardless of how well-formed `new` is.
    pub fn change_pin(&self, old: &str, new: &str) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.pin != old {
            return Err(Error::InvalidCredentials);
        }
        if !valid_pin(new) {
            return Err(Error::InvalidPin);
        }
        state.pin = new.to_owned();
        state.push_history("PIN changed.");
        Ok(())
    }

    /// Sets the block flag. Idempotent on state, but every call appends its
    /// own history line; callers should guard against redundant calls if
    /// duplicate log entries are undesirable.
    pub fn block(&self) {
        let mut state = self.state.lock();
        state.blocked = true;
        state.push_history("Account blocked by admin.");
    }

    /// Clears the block flag. Same logging behavior as [`Account::block`].
    pub fn unblock(&self) {
        let mut state = self.state.lock();
        state.blocked = false;
        state.push_history("Account unblocked.");
    }

    /// Flips the block flag in one critical section and returns the new
    /// state: blocked accounts are unblocked and vice versa.
    pub fn toggle_block(&self) -> bool {
        let mut state = self.state.lock();
        if state.blocked {
            state.blocked = false;
            state.push_history("Account unblocked.");
        } else {
            state.blocked = true;
            state.push_history("Account blocked by admin.");
        }
        state.blocked
    }

    /// Returns a defensive copy of the history, oldest line first.
    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Takes one consistent copy of the account for persistence.
    pub(crate) fn to_record(&self) -> AccountRecord {
        let state = self.state.lock();
        AccountRecord {
            username: self.username.clone(),
            pin: state.pin.clone(),
            balance: state.balance,
            blocked: state.blocked,
            history: state.history.iter().cloned().collect(),
        }
    }

    /// Rebuilds an account from a persisted record. History longer than the
    /// cap (e.g. from a hand-edited snapshot) is truncated to the newest
    /// [`HISTORY_LIMIT`] lines.
    pub(crate) fn from_record(record: AccountRecord) -> Self {
        let mut history: VecDeque<String> = record.history.into();
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
        Self {
            username: record.username,
            state: Mutex::new(AccountState {
                pin: record.pin,
                balance: record.balance,
                blocked: record.blocked,
                history,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_account_has_zero_balance_and_creation_entry() {
        let account = Account::new("alice", "1234");
        assert_eq!(account.balance(), Decimal::ZERO);
        assert!(!account.is_blocked());
        let history = account.history();
        assert_eq!(history.len(), 1);
        assert!(history[0].contains("Account created"));
    }

    #[test]
    fn test_deposit_increases_balance_and_logs() {
        let account = Account::new("alice", "1234");
        assert_eq!(account.deposit(dec!(500)).unwrap(), dec!(500));
        assert_eq!(account.balance(), dec!(500));
        let history = account.history();
        assert_eq!(history.len(), 2);
        assert!(history[1].contains("Deposited 500. Balance: 500"));
    }

    #[test]
    fn test_deposit_rejects_non_positive_amounts() {
        let account = Account::new("alice", "1234");
        assert_eq!(account.deposit(Decimal::ZERO), Err(Error::NonPositiveAmount));
        assert_eq!(account.deposit(dec!(-5)), Err(Error::NonPositiveAmount));
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.history().len(), 1); // only the creation line
    }

    #[test]
    fn test_withdraw_rejects_overdraft() {
        let account = Account::new("alice", "1234");
        account.deposit(dec!(500)).unwrap();
        assert_eq!(account.withdraw(dec!(600)), Err(Error::InsufficientFunds));
        assert_eq!(account.balance(), dec!(500));
    }

    #[test]
    fn test_withdraw_to_exactly_zero() {
        let account = Account::new("alice", "1234");
        account.deposit(dec!(500)).unwrap();
        assert_eq!(account.withdraw(dec!(500)).unwrap(), Decimal::ZERO);
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_withdraw_rejects_non_positive_amounts() {
        let account = Account::new("alice", "1234");
        account.deposit(dec!(10)).unwrap();
        assert_eq!(account.withdraw(Decimal::ZERO), Err(Error::NonPositiveAmount));
        assert_eq!(account.withdraw(dec!(-1)), Err(Error::NonPositiveAmount));
        assert_eq!(account.balance(), dec!(10));
    }

    #[test]
    fn test_balance_never_negative_over_mixed_sequence() {
        let account = Account::new("alice", "1234");
        let _ = account.deposit(dec!(100));
        let _ = account.withdraw(dec!(30));
        let _ = account.withdraw(dec!(80)); // fails
        let _ = account.deposit(dec!(-10)); // fails
        let _ = account.withdraw(dec!(70));
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_history_is_capped_fifo() {
        let account = Account::new("alice", "1234");
        // Creation line + 30 deposits = 31 appends; the creation line goes.
        for i in 1..=30 {
            account.deposit(Decimal::from(i)).unwrap();
        }
        let history = account.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history[0].contains("Deposited 1."));

        account.deposit(dec!(999)).unwrap();
        let history = account.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history[0].contains("Deposited 2."));
        assert!(history[HISTORY_LIMIT - 1].contains("Deposited 999."));
    }

    #[test]
    fn test_history_returns_defensive_copy() {
        let account = Account::new("alice", "1234");
        let mut history = account.history();
        history.clear();
        assert_eq!(account.history().len(), 1);
    }

    #[test]
    fn test_change_pin_requires_matching_old_pin() {
        let account = Account::new("alice", "1234");
        // Wrong old PIN fails even with a perfectly valid new PIN.
        assert_eq!(
            account.change_pin("9999", "5678"),
            Err(Error::InvalidCredentials)
        );
        assert!(account.validate_pin("1234"));
    }

    #[test]
    fn test_change_pin_rejects_malformed_new_pin() {
        let account = Account::new("alice", "1234");
        assert_eq!(account.change_pin("1234", "12"), Err(Error::InvalidPin));
        assert_eq!(account.change_pin("1234", "12a4"), Err(Error::InvalidPin));
        assert_eq!(account.change_pin("1234", "1234567"), Err(Error::InvalidPin));
        assert!(account.validate_pin("1234"));
    }

    #[test]
    fn test_change_pin_success() {
        let account = Account::new("alice", "1234");
        account.change_pin("1234", "567890").unwrap();
        assert!(account.validate_pin("567890"));
        assert!(!account.validate_pin("1234"));
        assert!(account.history().last().unwrap().contains("PIN changed."));
    }

    #[test]
    fn test_block_unblock_and_toggle() {
        let account = Account::new("alice", "1234");
        account.block();
        assert!(account.is_blocked());
        // validate_pin still works on a blocked account.
        assert!(account.validate_pin("1234"));

        assert!(!account.toggle_block());
        assert!(!account.is_blocked());
        assert!(account.toggle_block());
        assert!(account.is_blocked());

        let history = account.history();
        assert!(history[1].contains("blocked by admin"));
        assert!(history[2].contains("unblocked"));
        assert!(history[3].contains("blocked by admin"));
    }

    #[test]
    fn test_concurrent_deposits_are_serialized() {
        let account = Arc::new(Account::new("alice", "1234"));
        let threads = 8;
        let deposits_per_thread = 100;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let account = Arc::clone(&account);
                thread::spawn(move || {
                    for _ in 0..deposits_per_thread {
                        account.deposit(dec!(1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            account.balance(),
            Decimal::from(threads * deposits_per_thread)
        );
        assert_eq!(account.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_valid_username() {
        assert!(valid_username("abc"));
        assert!(valid_username("alice_99"));
        assert!(valid_username("A23456789012")); // 12 chars
        assert!(!valid_username("ab")); // too short
        assert!(!valid_username("A234567890123")); // 13 chars
        assert!(!valid_username("has space"));
        assert!(!valid_username("dash-ed"));
        assert!(!valid_username(""));
    }

    #[test]
    fn test_valid_pin() {
        assert!(valid_pin("1234"));
        assert!(valid_pin("123456"));
        assert!(!valid_pin("123"));
        assert!(!valid_pin("1234567"));
        assert!(!valid_pin("12a4"));
        assert!(!valid_pin(""));
    }
}
