//! Account service - account lifecycle rules
//!
//! Enforces "one active account per id" and the soft-delete lifecycle
//! (`Absent -> Active -> Deleted`). Storage is reached only through the
//! [`Repository`] port.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{validate_balance, Account, AccountId, AccountState, Currency};
use crate::ports::Repository;

/// Account service contract
///
/// Transports depend on this trait only. Cross-cutting behavior is added by
/// wrapping one implementation in another (see `LoggingAccountService`).
pub trait AccountService: Send + Sync {
    /// Open a new account
    ///
    /// Fails with `Validation` for a negative balance and with
    /// `AccountAlreadyExists` if the id is bound to an active account.
    fn create(&self, id: AccountId, currency: Currency, balance: Decimal) -> Result<()>;

    /// Fetch an active account
    fn load(&self, id: &AccountId) -> Result<Account>;

    /// Every active account, in repository order
    fn load_all(&self) -> Result<Vec<Account>>;

    /// Soft-delete an active account
    ///
    /// Not idempotent: deleting twice fails the second time with `UnknownAccount`.
    fn delete(&self, id: &AccountId) -> Result<()>;
}

impl<S: AccountService + ?Sized> AccountService for Box<S> {
    fn create(&self, id: AccountId, currency: Currency, balance: Decimal) -> Result<()> {
        (**self).create(id, currency, balance)
    }

    fn load(&self, id: &AccountId) -> Result<Account> {
        (**self).load(id)
    }

    fn load_all(&self) -> Result<Vec<Account>> {
        (**self).load_all()
    }

    fn delete(&self, id: &AccountId) -> Result<()> {
        (**self).delete(id)
    }
}

/// Account service backed by a repository
pub struct AccountManager {
    repository: Arc<dyn Repository>,
}

impl AccountManager {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }
}

impl AccountService for AccountManager {
    fn create(&self, id: AccountId, currency: Currency, balance: Decimal) -> Result<()> {
        let balance = validate_balance(balance)?;

        match self.repository.find(&id)? {
            AccountState::Active(_) => Err(Error::AccountAlreadyExists(id)),
            AccountState::Deleted(_) | AccountState::Absent => {
                self.repository.store(&Account::new(id, currency, balance))
            }
        }
    }

    fn load(&self, id: &AccountId) -> Result<Account> {
        self.repository
            .find(id)?
            .into_active()
            .ok_or_else(|| Error::UnknownAccount(id.clone()))
    }

    fn load_all(&self) -> Result<Vec<Account>> {
        // Storage failures propagate here exactly like in the other operations
        self.repository.find_all()
    }

    fn delete(&self, id: &AccountId) -> Result<()> {
        match self.repository.find(id)? {
            AccountState::Active(_) => self.repository.mark_deleted(id),
            AccountState::Deleted(_) | AccountState::Absent => {
                Err(Error::UnknownAccount(id.clone()))
            }
        }
    }
}
