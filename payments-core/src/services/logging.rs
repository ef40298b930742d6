//! Logging decorator for the account service
//!
//! Wraps any [`AccountService`] and records each call (method, inputs,
//! duration, error) to an [`EventSink`]. Results pass through untouched and
//! a failing sink never fails the call.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;

use super::account::AccountService;
use crate::domain::result::Result;
use crate::domain::{Account, AccountId, Currency};
use crate::ports::{CallEvent, EventSink};

/// Component name stamped on every event
pub const ACCOUNT_COMPONENT: &str = "account";

/// Account service decorator that records every call
pub struct LoggingAccountService<S> {
    inner: S,
    sink: Arc<dyn EventSink>,
}

impl<S: AccountService> LoggingAccountService<S> {
    pub fn new(inner: S, sink: Arc<dyn EventSink>) -> Self {
        Self { inner, sink }
    }

    fn emit<T>(&self, event: CallEvent, started: Instant, result: &Result<T>) {
        let mut event = event.took(started.elapsed());
        if let Err(e) = result {
            event = event.with_error(e.to_string());
        }
        let _ = self.sink.record(&event);
    }
}

impl<S: AccountService> AccountService for LoggingAccountService<S> {
    fn create(&self, id: AccountId, currency: Currency, balance: Decimal) -> Result<()> {
        let event = CallEvent::new(ACCOUNT_COMPONENT, "create")
            .with_account(id.as_str())
            .with_detail(format!("currency={} balance={}", currency, balance));
        let started = Instant::now();
        let result = self.inner.create(id, currency, balance);
        self.emit(event, started, &result);
        result
    }

    fn load(&self, id: &AccountId) -> Result<Account> {
        let mut event = CallEvent::new(ACCOUNT_COMPONENT, "load").with_account(id.as_str());
        let started = Instant::now();
        let result = self.inner.load(id);
        if let Ok(account) = &result {
            event = event.with_detail(format!(
                "currency={} balance={}",
                account.currency, account.balance
            ));
        }
        self.emit(event, started, &result);
        result
    }

    fn load_all(&self) -> Result<Vec<Account>> {
        let mut event = CallEvent::new(ACCOUNT_COMPONENT, "load_all");
        let started = Instant::now();
        let result = self.inner.load_all();
        if let Ok(accounts) = &result {
            event = event.with_detail(format!("count={}", accounts.len()));
        }
        self.emit(event, started, &result);
        result
    }

    fn delete(&self, id: &AccountId) -> Result<()> {
        let event = CallEvent::new(ACCOUNT_COMPONENT, "delete").with_account(id.as_str());
        let started = Instant::now();
        let result = self.inner.delete(id);
        self.emit(event, started, &result);
        result
    }
}
