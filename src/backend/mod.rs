mod csv_store;
mod interface;

pub use interface::{AccountStore, Result, BackendError};
pub use csv_store::CsvStore;
