use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;

use crate::backend::interface::{AccountStore, BackendError, Result};
use crate::core::{Account, AccountNumber, Amount};

/// Columns of the account table, in file order.
#[derive(Clone, Copy, Debug)]
enum Column {
    AccountNumber,
    Name,
    Balance
}

impl Column {
    const ALL: [Column; 3] = [Column::AccountNumber, Column::Name, Column::Balance];

    fn header(self) -> &'static str {
        match self {
            Column::AccountNumber => "account_number",
            Column::Name => "name",
            Column::Balance => "balance"
        }
    }

    fn get(self, record: &StringRecord) -> &str {
        &record[self as usize]
    }
}

type RowResult<T> = std::result::Result<T, String>;

/// Keeps accounts in a comma-separated file with a header row.
pub struct CsvStore {
    path: PathBuf
}

impl CsvStore {
    pub fn new(path: impl AsRef<Path>) -> CsvStore {
        CsvStore { path: path.as_ref().to_path_buf() }
    }

    fn io_error(&self, source: io::Error) -> BackendError {
        BackendError::Io { path: self.path.clone(), source }
    }

    fn check_header(header: &StringRecord) -> Result<()> {
        let expected = Column::ALL.map(Column::header);
        if header.iter().ne(expected.iter().copied()) {
            return Err(BackendError::Parse {
                line: 1,
                reason: format!("expected header {:?}, found {:?}", expected.join(","), header.iter().collect::<Vec<_>>().join(","))
            });
        }
        return Ok(());
    }

    fn parse_row(record: &StringRecord) -> RowResult<Account> {
        if record.len() != Column::ALL.len() {
            return Err(format!("expected {} fields, found {}", Column::ALL.len(), record.len()));
        }

        let number = Self::parse_number(Column::AccountNumber.get(record))?;
        let name = Column::Name.get(record);
        let balance = Self::parse_balance(Column::Balance.get(record))?;
        return Ok(Account::new(number, name, balance));
    }

    fn parse_number(text: &str) -> RowResult<AccountNumber> {
        match text.trim().parse::<AccountNumber>() {
            // MAX would leave no number for the next account
            Ok(number) if number > 0 && number < AccountNumber::MAX => Ok(number),
            _ => Err(format!("account_number {:?} is not a usable account number", text))
        }
    }

    fn parse_balance(text: &str) -> RowResult<Amount> {
        let balance = text.trim().parse::<Amount>()
            .map_err(|_| format!("balance {:?} is not a number", text))?;
        if !balance.is_finite() || balance < 0.0 {
            return Err(format!("balance {:?} must be a non-negative amount", text));
        }
        return Ok(balance);
    }
}

impl AccountStore for CsvStore {
    fn read(&self) -> Result<Vec<Account>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist, starting empty", self.path.display());
                return Ok(Vec::new());
            },
            Err(err) => return Err(self.io_error(err))
        };

        // row lengths are checked against the schema, with line numbers
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        Self::check_header(reader.headers()?)?;

        let mut accounts = Vec::new();
        let mut seen: HashSet<AccountNumber> = HashSet::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |pos| pos.line());

            let account = Self::parse_row(&record)
                .map_err(|reason| BackendError::Parse { line, reason })?;
            if !seen.insert(account.number()) {
                return Err(BackendError::Parse {
                    line,
                    reason: format!("duplicate account number {}", account.number())
                });
            }
            accounts.push(account);
        }

        debug!("read {} rows from {}", accounts.len(), self.path.display());
        return Ok(accounts);
    }

    fn save(&self, accounts: &[&Account]) -> Result<()> {
        let file = File::create(&self.path).map_err(|err| self.io_error(err))?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        // written by hand so an empty book still gets its header
        writer.write_record(Column::ALL.map(Column::header))?;
        for account in accounts {
            writer.write_record([
                account.number().to_string(),
                account.name().to_owned(),
                // Debug keeps the decimal point on whole amounts: 150.0
                format!("{:?}", account.balance())
            ])?;
        }
        writer.flush().map_err(|err| self.io_error(err))?;

        debug!("wrote {} rows to {}", accounts.len(), self.path.display());
        return Ok(());
    }
}
