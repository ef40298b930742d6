//! Event log - structured record of service calls in DuckDB
//!
//! Stores one row per service call in logs.duckdb, next to the accounts
//! database. Only ids, method names, timings and error messages are kept;
//! the logging decorator decides what goes into `detail`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use super::migration::MigrationService;
use crate::adapters::duckdb::{is_retryable_error, INITIAL_RETRY_DELAY_MS, MAX_RETRIES};
use crate::domain::result::{Error, Result as CoreResult};
use crate::log_migrations::LOG_MIGRATIONS;
use crate::ports::{CallEvent, EventSink};

/// File name of the event log database
pub const LOG_DB_FILENAME: &str = "logs.duckdb";

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    let timestamp = now_ms().max(0) as u64;

    // Lower 16 bits hold the counter (65536 unique IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (timestamp << 16) | counter
}

/// Current unix timestamp in milliseconds
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Detect the current platform
fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Who is driving the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    /// Embedded as a library by another program
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub component: String,
    pub method: String,
    pub account_id: Option<String>,
    pub detail: Option<String>,
    pub took_ms: i64,
    pub error_message: Option<String>,
}

const SELECT_ENTRIES: &str = "SELECT id, timestamp, entry_point, app_version, platform,
        component, method, account_id, detail, took_ms, error_message
 FROM sys_logs";

fn row_to_entry(row: &duckdb::Row) -> duckdb::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        entry_point: row.get(2)?,
        app_version: row.get(3)?,
        platform: row.get(4)?,
        component: row.get(5)?,
        method: row.get(6)?,
        account_id: row.get(7)?,
        detail: row.get(8)?,
        took_ms: row.get(9)?,
        error_message: row.get(10)?,
    })
}

/// DuckDB-backed call log
pub struct EventLog {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl EventLog {
    /// Open or create logs.duckdb in the data directory and run pending migrations
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = data_dir.join(LOG_DB_FILENAME);
        let conn = Self::open_with_retry(&db_path)
            .with_context(|| format!("Failed to open event log at {:?}", db_path))?;
        Self::with_connection(conn, Some(db_path), entry_point, app_version.into())
    }

    /// Open logs.duckdb, backing off while another process holds its file lock
    fn open_with_retry(db_path: &Path) -> duckdb::Result<Connection> {
        let mut attempt = 0;
        loop {
            match Connection::open(db_path) {
                Ok(conn) => return Ok(conn),
                Err(e) if attempt + 1 < MAX_RETRIES && is_retryable_error(&e.to_string()) => {
                    thread::sleep(Duration::from_millis(
                        INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt),
                    ));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Event log that lives only as long as this value
    pub fn open_in_memory(entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None, entry_point, app_version.into())
    }

    fn with_connection(
        conn: Connection,
        db_path: Option<PathBuf>,
        entry_point: EntryPoint,
        app_version: String,
    ) -> Result<Self> {
        MigrationService::new(&conn, LOG_MIGRATIONS).run_pending()?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version,
            platform: detect_platform(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Append one call event
    ///
    /// Entry point, app version and platform come from the log itself.
    pub fn log(&self, event: &CallEvent) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO sys_logs (
                id, timestamp, entry_point, app_version, platform,
                component, method, account_id, detail, took_ms, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.component,
                &event.method,
                &event.account_id,
                &event.detail,
                i64::try_from(event.took_ms).unwrap_or(i64::MAX),
                &event.error,
            ],
        )?;

        Ok(())
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY timestamp DESC, id DESC LIMIT ?",
            SELECT_ENTRIES
        ))?;

        let entries = stmt
            .query_map([limit as i64], row_to_entry)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Most recent failed calls first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE error_message IS NOT NULL ORDER BY timestamp DESC, id DESC LIMIT ?",
            SELECT_ENTRIES
        ))?;

        let entries = stmt
            .query_map([limit as i64], row_to_entry)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Get the total number of log entries
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Number of failed calls
    pub fn error_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_logs WHERE error_message IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Delete logs older than the specified timestamp (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    /// Copy the log database to `output_path` for troubleshooting
    pub fn export(&self, output_path: &Path) -> Result<PathBuf> {
        let db_path = self
            .db_path
            .as_deref()
            .ok_or_else(|| anyhow!("In-memory event log cannot be exported"))?;

        let conn = self.lock()?;
        // Flush the WAL so the copy is complete
        conn.execute("CHECKPOINT", [])?;
        std::fs::copy(db_path, output_path)?;

        Ok(output_path.to_path_buf())
    }

    /// Path of logs.duckdb, `None` when in memory
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

impl EventSink for EventLog {
    fn record(&self, event: &CallEvent) -> CoreResult<()> {
        self.log(event).map_err(|e| Error::storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_event_log_creation() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        assert!(log.db_path().unwrap().exists());
    }

    #[test]
    fn test_log_event() {
        let log = EventLog::open_in_memory(EntryPoint::Cli, "1.0.0").unwrap();

        let event = CallEvent::new("account", "create")
            .with_account("A1")
            .with_detail("currency=USD balance=0");
        log.log(&event).unwrap();

        let entries = log.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].component, "account");
        assert_eq!(entries[0].method, "create");
        assert_eq!(entries[0].account_id.as_deref(), Some("A1"));
        assert_eq!(entries[0].entry_point, "cli");
        assert_eq!(entries[0].app_version, "1.0.0");
        assert!(entries[0].error_message.is_none());
    }

    #[test]
    fn test_log_error() {
        let log = EventLog::open_in_memory(EntryPoint::Library, "2.0.0").unwrap();

        log.log(&CallEvent::new("account", "load").with_account("A9")).unwrap();
        log.log(
            &CallEvent::new("account", "delete")
                .with_account("A9")
                .with_error("Unknown account: A9"),
        )
        .unwrap();

        let errors = log.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].method, "delete");
        assert_eq!(errors[0].error_message.as_deref(), Some("Unknown account: A9"));
        assert_eq!(errors[0].entry_point, "library");
        assert_eq!(log.error_count().unwrap(), 1);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let log = EventLog::open_in_memory(EntryPoint::Cli, "1.0.0").unwrap();
        for method in ["create", "load", "delete"] {
            log.log(&CallEvent::new("account", method)).unwrap();
        }

        let methods: Vec<_> = log
            .get_recent(2)
            .unwrap()
            .into_iter()
            .map(|e| e.method)
            .collect();
        assert_eq!(methods, vec!["delete", "load"]);
    }

    #[test]
    fn test_count_and_delete() {
        let log = EventLog::open_in_memory(EntryPoint::Cli, "1.0.0").unwrap();

        for method in ["create", "load", "load_all"] {
            log.log(&CallEvent::new("account", method)).unwrap();
        }
        assert_eq!(log.count().unwrap(), 3);

        // Delete all logs (using future timestamp)
        let deleted = log.delete_before(now_ms() + 1000).unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn test_export() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        log.log(&CallEvent::new("account", "load_all")).unwrap();

        let export_path = dir.path().join("export.duckdb");
        log.export(&export_path).unwrap();
        assert!(export_path.exists());

        let in_memory = EventLog::open_in_memory(EntryPoint::Cli, "1.0.0").unwrap();
        assert!(in_memory.export(&export_path).is_err());
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let dir = tempdir().unwrap();
        {
            let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
            log.record(&CallEvent::new("account", "create")).unwrap();
        }
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        assert_eq!(log.count().unwrap(), 1);
    }
}
