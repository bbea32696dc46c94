use std::fmt;

use serde::Serialize;

pub type AccountNumber = u64;
pub type Amount = f64;

/// A named account holding a non-negative balance.
///
/// Accounts only come into existence through the registry (or when a
/// storage backend rebuilds one), so the number is never chosen by
/// outside code.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Account {
    #[serde(rename = "account_number")]
    number: AccountNumber,
    name: String,
    balance: Amount
}

impl Account {
    pub(crate) fn new(number: AccountNumber, name: &str, balance: Amount) -> Account {
        Account { number, name: name.to_owned(), balance }
    }

    pub fn number(&self) -> AccountNumber {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub(crate) fn credit(&mut self, amount: Amount) {
        self.balance += amount;
    }

    /// Takes `amount` off the balance, unless that would leave it negative.
    pub(crate) fn debit(&mut self, amount: Amount) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        return true;
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.number, self.name, self.balance)
    }
}
