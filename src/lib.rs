mod core;
pub mod backend;
pub mod config;

pub use crate::core::{Account, AccountNumber, Amount, AccountRegistry, LedgerError, LedgerResult};
pub use crate::core::{account, registry, error};
