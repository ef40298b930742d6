//! DuckDB repository implementation

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountId, AccountState, Currency};
use crate::migrations::MIGRATIONS;
use crate::ports::Repository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
pub(crate) const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
pub(crate) const INITIAL_RETRY_DELAY_MS: u64 = 50;

const SELECT_ACCOUNT: &str = "SELECT account_id, currency, balance, deleted FROM sys_accounts";

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Check if an error message indicates a file locking issue that should be retried
pub(crate) fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Columns of one `sys_accounts` row, before domain validation
type AccountColumns = (String, String, String, bool);

fn read_columns(row: &duckdb::Row) -> duckdb::Result<AccountColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn corrupt(column: &str, e: impl fmt::Display) -> Error {
    Error::storage(format!("corrupt {} in sys_accounts: {}", column, e))
}

/// Rebuild an account from stored columns
///
/// A row that no longer passes domain validation is reported as a storage error.
fn account_from_columns((id, currency, balance, deleted): AccountColumns) -> Result<Account> {
    let id = AccountId::parse(&id).map_err(|e| corrupt("account_id", e))?;
    let currency = Currency::from_str(&currency).map_err(|e| corrupt("currency", e))?;
    let balance = Decimal::from_str(&balance).map_err(|e| corrupt("balance", e))?;
    Ok(Account {
        id,
        currency,
        balance,
        deleted,
    })
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    log_statements: bool,
}

impl DuckDbRepository {
    /// Open (or create) the accounts database
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when another process holds the database file.
    pub fn new(db_path: &Path, log_statements: bool) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        log_statements,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[payments] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::storage(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Non-persistent database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            log_statements: false,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Autoloaded extensions are never needed and can fail code signing checks on macOS
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::storage(format!("Migration failed: {}", e)))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    /// Echo a statement to stderr when statement logging is on
    fn trace(&self, sql: &str, args: &[&str]) {
        if self.log_statements {
            let sql = sql.split_whitespace().collect::<Vec<_>>().join(" ");
            eprintln!("[payments] {} {:?}", sql, args);
        }
    }
}

impl Repository for DuckDbRepository {
    fn store(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;
        let id = account.id.as_str();

        // Checked under the connection lock, so no other store can interleave
        if account.is_active() {
            let sql = "SELECT COUNT(*) FROM sys_accounts WHERE account_id = ? AND NOT deleted";
            self.trace(sql, &[id]);
            let active: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
            if active > 0 {
                return Err(Error::AccountAlreadyExists(account.id.clone()));
            }
        }

        let sql = "INSERT INTO sys_accounts (account_id, currency, balance, deleted)
                   VALUES (?, ?, ?, ?)";
        let balance = account.balance.to_string();
        self.trace(sql, &[id, account.currency.code(), balance.as_str()]);
        conn.execute(
            sql,
            params![id, account.currency.code(), balance, account.deleted],
        )?;
        Ok(())
    }

    fn find(&self, id: &AccountId) -> Result<AccountState> {
        let conn = self.lock()?;
        // FALSE sorts first: the active row wins, then the newest deleted one
        let sql = format!(
            "{} WHERE account_id = ? ORDER BY deleted ASC, row_id DESC LIMIT 1",
            SELECT_ACCOUNT
        );
        self.trace(&sql, &[id.as_str()]);

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id.as_str()], read_columns)?;
        let record = match rows.next() {
            Some(columns) => Some(account_from_columns(columns?)?),
            None => None,
        };
        Ok(AccountState::classify(record))
    }

    fn find_all(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE NOT deleted ORDER BY account_id", SELECT_ACCOUNT);
        self.trace(&sql, &[]);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_columns)?;
        let mut accounts = Vec::new();
        for columns in rows {
            accounts.push(account_from_columns(columns?)?);
        }
        Ok(accounts)
    }

    fn mark_deleted(&self, id: &AccountId) -> Result<()> {
        let conn = self.lock()?;
        let sql = "UPDATE sys_accounts SET deleted = TRUE WHERE account_id = ? AND NOT deleted";
        self.trace(sql, &[id.as_str()]);

        let updated = conn.execute(sql, [id.as_str()])?;
        if updated == 0 {
            return Err(Error::UnknownAccount(id.clone()));
        }
        Ok(())
    }
}
