use std::{io, path::PathBuf};

use thiserror::Error;

use crate::core::Account;

/// Somewhere a registry's accounts can be kept between runs.
pub trait AccountStore {
    /// Reads every stored account. A store that was never written
    /// reads as empty.
    fn read(&self) -> Result<Vec<Account>>;
    fn save(&self, accounts: &[&Account]) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The underlying file could not be opened, created or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error
    },
    /// The tabular reader or writer failed below the row level.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// A stored row does not match the account schema.
    #[error("line {line}: {reason}")]
    Parse {
        line: u64,
        reason: String
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
