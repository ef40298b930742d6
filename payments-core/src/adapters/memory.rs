//! In-memory adapters
//!
//! Same semantics as the DuckDB repository, without persistence. Used for
//! tests and for throwaway CLI sessions.

use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountId, AccountState};
use crate::ports::{CallEvent, EventSink, Repository};

/// Repository backed by a vector of records
///
/// Deleted records stay in the vector, like soft-deleted rows in a table.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<Vec<Account>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Account>>> {
        self.records
            .read()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Account>>> {
        self.records
            .write()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }
}

impl Repository for InMemoryRepository {
    fn store(&self, account: &Account) -> Result<()> {
        let mut records = self.write()?;
        if account.is_active() && records.iter().any(|a| a.id == account.id && a.is_active()) {
            return Err(Error::AccountAlreadyExists(account.id.clone()));
        }
        records.push(account.clone());
        Ok(())
    }

    fn find(&self, id: &AccountId) -> Result<AccountState> {
        let records = self.read()?;
        let record = records
            .iter()
            .find(|a| a.id == *id && a.is_active())
            .or_else(|| records.iter().rev().find(|a| a.id == *id))
            .cloned();
        Ok(AccountState::classify(record))
    }

    fn find_all(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .read()?
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    fn mark_deleted(&self, id: &AccountId) -> Result<()> {
        let mut records = self.write()?;
        match records.iter_mut().find(|a| a.id == *id && a.is_active()) {
            Some(account) => {
                account.deleted = true;
                Ok(())
            }
            None => Err(Error::UnknownAccount(id.clone())),
        }
    }
}

/// Event sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<CallEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<CallEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &CallEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?
            .push(event.clone());
        Ok(())
    }
}
