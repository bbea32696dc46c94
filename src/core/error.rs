use thiserror::Error;

use crate::core::Amount;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    /// Occurs when a deposit, withdrawal or transfer is given a
    /// non-positive amount, or an account is opened with a negative
    /// starting balance. Non-finite amounts are always rejected.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: Amount,
        reason: &'static str
    },
    /// Occurs when the registry has handed out the largest
    /// representable account number and cannot open another account.
    #[error("no account numbers left to assign")]
    AccountNumbersExhausted
}

pub type LedgerResult<T> = Result<T, LedgerError>;
