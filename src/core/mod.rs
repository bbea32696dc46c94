pub mod account;
pub mod registry;
pub mod error;

pub use account::{Account, AccountNumber, Amount};
pub use registry::AccountRegistry;
pub use error::{LedgerError, LedgerResult};
