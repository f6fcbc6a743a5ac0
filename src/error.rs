//! Domain-specific errors for the account engine.
//!
//! Contains error variants for common failure cases like:
//! - Registration errors (bad username/PIN shape, duplicate user)
//! - Authentication errors (unknown user, wrong credentials, blocked)
//! - Balance mutation errors (non-positive amount, insufficient funds)
//!
//! These errors represent business logic failures. Persistence failures
//! never appear here: the snapshot store absorbs them per its fail-open
//! policy and only exposes them through `last_error`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("account is blocked")]
    AccountBlocked,
    #[error("user already exists")]
    DuplicateUser,
    #[error("insufficient balance")]
    InsufficientFunds,
    #[error("invalid username or PIN")]
    InvalidCredentials,
    #[error("PIN must be 4-6 digits")]
    InvalidPin,
    #[error("username must be 3-12 characters: letters, numbers or underscore")]
    InvalidUsername,
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("no such account")]
    NotFound,
}
