use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};

use crate::backend::{self, AccountStore, CsvStore};
use crate::core::account::{Account, AccountNumber, Amount};
use crate::core::error::{LedgerError, LedgerResult};

type AccountsByNumber = BTreeMap<AccountNumber, Account>;

/// All accounts of one ledger, together with the counter handing out
/// account numbers. Each registry owns its own counter.
#[derive(Debug)]
pub struct AccountRegistry {
    accounts: AccountsByNumber,
    next_account_number: AccountNumber
}

impl Default for AccountRegistry {
    fn default() -> Self {
        AccountRegistry::new()
    }
}

impl AccountRegistry {
    const FIRST_ACCOUNT_NUMBER: AccountNumber = 1;

    pub fn new() -> AccountRegistry {
        return AccountRegistry {
            accounts: BTreeMap::new(),
            next_account_number: Self::FIRST_ACCOUNT_NUMBER
        };
    }

    /// Rebuilds a registry from previously stored accounts. The counter
    /// resumes one past the highest number seen.
    pub(crate) fn from_accounts(accounts: Vec<Account>) -> AccountRegistry {
        let accounts: AccountsByNumber = accounts.into_iter()
            .map(|account| (account.number(), account))
            .collect();
        // a counter stuck at MAX makes every later create fail
        let next_account_number = accounts.keys().next_back()
            .map_or(Self::FIRST_ACCOUNT_NUMBER, |last| last.checked_add(1).unwrap_or(AccountNumber::MAX));

        return AccountRegistry { accounts, next_account_number };
    }

    pub fn create_account(&mut self, name: &str, starting_balance: Amount) -> LedgerResult<AccountNumber> {
        if !starting_balance.is_finite() || starting_balance < 0.0 {
            return Err(LedgerError::InvalidAmount {
                amount: starting_balance,
                reason: "starting balance cannot be negative"
            });
        }

        let number = self.next_account_number;
        let Some(next) = number.checked_add(1) else {
            return Err(LedgerError::AccountNumbersExhausted);
        };
        self.accounts.insert(number, Account::new(number, name, starting_balance));
        self.next_account_number = next;

        info!("opened account #{} for {:?} with {}", number, name, starting_balance);
        return Ok(number);
    }

    /// Returns `Ok(false)` when the account does not exist.
    pub fn deposit(&mut self, number: AccountNumber, amount: Amount) -> LedgerResult<bool> {
        check_positive(amount, "deposit amount must be positive")?;

        match self.accounts.get_mut(&number) {
            Some(account) => {
                check_credit(account, amount)?;
                account.credit(amount);
                debug!("deposited {} into #{}", amount, number);
                Ok(true)
            },
            None => {
                warn!("deposit into unknown account #{}", number);
                Ok(false)
            }
        }
    }

    /// Returns `Ok(false)` when the account does not exist or holds less
    /// than `amount`; the balance is then left as it was.
    pub fn withdraw(&mut self, number: AccountNumber, amount: Amount) -> LedgerResult<bool> {
        check_positive(amount, "withdrawal amount must be positive")?;

        let Some(account) = self.accounts.get_mut(&number) else {
            warn!("withdrawal from unknown account #{}", number);
            return Ok(false);
        };

        if !account.debit(amount) {
            warn!("insufficient funds in #{} to withdraw {}", number, amount);
            return Ok(false);
        }
        debug!("withdrew {} from #{}", amount, number);
        return Ok(true);
    }

    /// Moves `amount` between two accounts. Both balances change or
    /// neither does: every check happens before the first mutation.
    /// A transfer to the same account leaves its balance untouched.
    pub fn transfer(&mut self, from: AccountNumber, to: AccountNumber, amount: Amount) -> LedgerResult<bool> {
        check_positive(amount, "transfer amount must be positive")?;

        let (Some(source), Some(destination)) = (self.accounts.get(&from), self.accounts.get(&to)) else {
            warn!("transfer between unknown accounts #{} and #{}", from, to);
            return Ok(false);
        };
        if source.balance() < amount {
            warn!("insufficient funds in #{} to transfer {}", from, amount);
            return Ok(false);
        }
        if from == to {
            debug!("transfer of {} from #{} to itself", amount, from);
            return Ok(true);
        }
        check_credit(destination, amount)?;

        // both accounts were found above, so neither lookup can miss
        if let Some(source) = self.accounts.get_mut(&from) {
            source.debit(amount);
        }
        if let Some(destination) = self.accounts.get_mut(&to) {
            destination.credit(amount);
        }
        debug!("transferred {} from #{} to #{}", amount, from, to);
        return Ok(true);
    }

    pub fn get_account(&self, number: AccountNumber) -> Option<&Account> {
        self.accounts.get(&number)
    }

    /// Accounts in ascending number order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Account> + 'a {
        self.accounts.values()
            .filter(move |account| account.name() == name)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn next_account_number(&self) -> AccountNumber {
        self.next_account_number
    }

    pub fn total_balance(&self) -> Amount {
        return self.accounts.values()
            .map(|account| account.balance()).sum();
    }

    pub fn save(&self, path: impl AsRef<Path>) -> backend::Result<()> {
        self.save_to(&CsvStore::new(path))
    }

    /// Replaces every account with the contents of the file at `path`.
    /// A missing file empties the registry; a malformed one leaves it as is.
    pub fn load(&mut self, path: impl AsRef<Path>) -> backend::Result<()> {
        self.load_from(&CsvStore::new(path))
    }

    pub fn save_to(&self, store: &impl AccountStore) -> backend::Result<()> {
        let accounts: Vec<&Account> = self.accounts().collect();
        store.save(&accounts)?;
        info!("saved {} accounts", accounts.len());
        return Ok(());
    }

    pub fn load_from(&mut self, store: &impl AccountStore) -> backend::Result<()> {
        let accounts = store.read()?;
        *self = AccountRegistry::from_accounts(accounts);
        info!("loaded {} accounts, next account number is {}", self.len(), self.next_account_number);
        return Ok(());
    }
}

fn check_positive(amount: Amount, reason: &'static str) -> LedgerResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount { amount, reason });
    }
    return Ok(());
}

fn check_credit(account: &Account, amount: Amount) -> LedgerResult<()> {
    if !(account.balance() + amount).is_finite() {
        return Err(LedgerError::InvalidAmount { amount, reason: "resulting balance is too large" });
    }
    return Ok(());
}


#[cfg(test)]
mod tests {
    use crate::core::{Account, AccountRegistry, LedgerError};

    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> AccountRegistry {
        let mut registry = AccountRegistry::new();
        registry.create_account("Alice", 100.0).unwrap();
        registry.create_account("Bob", 200.0).unwrap();
        return registry;
    }

    fn balance_of(registry: &AccountRegistry, number: u64) -> f64 {
        registry.get_account(number).unwrap().balance()
    }

    #[test]
    fn create_account() {
        let mut registry = AccountRegistry::new();
        assert_eq!(registry.next_account_number(), 1);

        let number = registry.create_account("Alice", 100.0).unwrap();

        assert_eq!(number, 1);
        let alice = registry.get_account(1).unwrap();
        assert_eq!(alice.name(), "Alice");
        assert_eq!(alice.balance(), 100.0);
        assert_eq!(registry.next_account_number(), 2);
    }

    #[test]
    fn create_account_negative_balance() {
        let mut registry = AccountRegistry::new();
        let res = registry.create_account("Bob", -50.0);

        assert!(matches!(res, Err(LedgerError::InvalidAmount { amount, .. }) if amount == -50.0));
        assert!(registry.is_empty());
        assert_eq!(registry.next_account_number(), 1);
    }

    #[test]
    fn numbers_never_reused_after_failed_create() {
        let mut registry = AccountRegistry::new();
        assert_eq!(registry.create_account("Alice", 0.0).unwrap(), 1);
        assert!(registry.create_account("Bob", -1.0).is_err());
        assert!(registry.create_account("Bob", f64::NAN).is_err());
        assert_eq!(registry.create_account("Bob", 5.0).unwrap(), 2);
        assert_eq!(registry.create_account("", 5.0).unwrap(), 3);
    }

    #[rstest]
    fn deposit(mut registry: AccountRegistry) {
        assert_eq!(registry.deposit(1, 50.0), Ok(true));
        assert_eq!(balance_of(&registry, 1), 150.0);
        assert_eq!(balance_of(&registry, 2), 200.0);
    }

    #[test]
    fn deposit_non_existing() {
        let mut registry = AccountRegistry::new();
        assert_eq!(registry.deposit(999, 100.0), Ok(false));
        assert!(registry.is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_amounts_rejected(mut registry: AccountRegistry, #[case] amount: f64) {
        assert!(matches!(registry.deposit(1, amount), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(registry.withdraw(1, amount), Err(LedgerError::InvalidAmount { .. })));
        assert!(matches!(registry.transfer(1, 2, amount), Err(LedgerError::InvalidAmount { .. })));
        // amount is checked before the account lookup
        assert!(registry.deposit(999, amount).is_err());

        assert_eq!(balance_of(&registry, 1), 100.0);
        assert_eq!(balance_of(&registry, 2), 200.0);
    }

    #[rstest]
    fn withdraw_sufficient(mut registry: AccountRegistry) {
        assert_eq!(registry.withdraw(2, 50.0), Ok(true));
        assert_eq!(balance_of(&registry, 2), 150.0);
    }

    #[rstest]
    fn withdraw_whole_balance(mut registry: AccountRegistry) {
        assert_eq!(registry.withdraw(1, 100.0), Ok(true));
        assert_eq!(balance_of(&registry, 1), 0.0);
    }

    #[rstest]
    fn withdraw_insufficient(mut registry: AccountRegistry) {
        assert_eq!(registry.withdraw(1, 100.5), Ok(false));
        assert_eq!(balance_of(&registry, 1), 100.0);
    }

    #[rstest]
    fn withdraw_non_existing(mut registry: AccountRegistry) {
        assert_eq!(registry.withdraw(3, 1.0), Ok(false));
    }

    #[rstest]
    fn transfer_success(mut registry: AccountRegistry) {
        let total = registry.total_balance();

        assert_eq!(registry.transfer(2, 1, 150.0), Ok(true));

        assert_eq!(balance_of(&registry, 1), 250.0);
        assert_eq!(balance_of(&registry, 2), 50.0);
        assert_eq!(registry.total_balance(), total);
    }

    #[rstest]
    fn transfer_insufficient(mut registry: AccountRegistry) {
        assert_eq!(registry.transfer(1, 2, 300.0), Ok(false));
        assert_eq!(balance_of(&registry, 1), 100.0);
        assert_eq!(balance_of(&registry, 2), 200.0);
    }

    #[rstest]
    #[case(1, 999)]
    #[case(999, 1)]
    #[case(998, 999)]
    fn transfer_invalid_account(mut registry: AccountRegistry, #[case] from: u64, #[case] to: u64) {
        assert_eq!(registry.transfer(from, to, 50.0), Ok(false));
        assert_eq!(balance_of(&registry, 1), 100.0);
        assert_eq!(balance_of(&registry, 2), 200.0);
    }

    #[rstest]
    fn transfer_to_self(mut registry: AccountRegistry) {
        assert_eq!(registry.transfer(1, 1, 60.0), Ok(true));
        assert_eq!(balance_of(&registry, 1), 100.0);

        assert_eq!(registry.transfer(1, 1, 160.0), Ok(false));
        assert_eq!(balance_of(&registry, 1), 100.0);
    }

    #[test]
    fn transfer_to_self_keeps_exact_balance() {
        let mut registry = AccountRegistry::new();
        registry.create_account("Eve", 0.9).unwrap();

        assert_eq!(registry.transfer(1, 1, 0.3), Ok(true));
        assert_eq!(balance_of(&registry, 1), 0.9);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut registry = AccountRegistry::new();
        registry.create_account("Big", f64::MAX).unwrap();
        registry.create_account("Small", f64::MAX).unwrap();

        let res = registry.deposit(1, f64::MAX);
        assert!(matches!(res, Err(LedgerError::InvalidAmount { .. })));
        assert_eq!(balance_of(&registry, 1), f64::MAX);

        let res = registry.transfer(2, 1, f64::MAX);
        assert!(matches!(res, Err(LedgerError::InvalidAmount { .. })));
        assert_eq!(balance_of(&registry, 1), f64::MAX);
        assert_eq!(balance_of(&registry, 2), f64::MAX);
    }

    #[test]
    fn create_when_numbers_exhausted() {
        let mut registry = AccountRegistry::from_accounts(vec![
            Account::new(u64::MAX - 1, "Last", 1.0)
        ]);
        assert_eq!(registry.next_account_number(), u64::MAX);

        assert_eq!(registry.create_account("Late", 1.0), Err(LedgerError::AccountNumbersExhausted));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_account_number(), u64::MAX);
    }

    #[test]
    fn from_accounts_at_max_number() {
        let mut registry = AccountRegistry::from_accounts(vec![
            Account::new(u64::MAX, "Max", 1.0)
        ]);
        assert_eq!(registry.next_account_number(), u64::MAX);
        assert!(registry.create_account("Late", 1.0).is_err());
        assert_eq!(registry.get_account(u64::MAX).unwrap().name(), "Max");
    }

    #[rstest]
    fn find_by_name(mut registry: AccountRegistry) {
        registry.create_account("Alice", 5.0).unwrap();

        let numbers: Vec<u64> = registry.find_by_name("Alice")
            .map(Account::number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(registry.find_by_name("Merry").count(), 0);
    }

    #[test]
    fn from_accounts_recomputes_counter() {
        let registry = AccountRegistry::from_accounts(vec![
            Account::new(7, "Gimli", 1.0),
            Account::new(2, "Legolas", 2.0)
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.next_account_number(), 8);
        let numbers: Vec<u64> = registry.accounts().map(Account::number).collect();
        assert_eq!(numbers, vec![2, 7]);

        let empty = AccountRegistry::from_accounts(vec![]);
        assert_eq!(empty.next_account_number(), 1);
    }

    #[test]
    fn registries_are_independent() {
        let mut first = AccountRegistry::new();
        let mut second = AccountRegistry::new();
        first.create_account("Bilbo", 1.0).unwrap();
        first.create_account("Frodo", 1.0).unwrap();

        assert_eq!(second.create_account("Sam", 1.0).unwrap(), 1);
    }
}
