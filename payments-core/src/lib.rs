//! Payments Core - account service for the payments system
//!
//! This crate implements the account domain following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, AccountId, Currency) and the error taxonomy
//! - **ports**: Trait definitions for external dependencies (Repository, EventSink)
//! - **services**: The account service, its logging decorator, the event log
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use adapters::memory::InMemoryRepository;
use config::Config;
use ports::Repository;
use services::{AccountManager, LoggingAccountService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use domain::{Account, AccountId, AccountState, Currency, NewAccountRequest};
pub use services::{AccountService, EntryPoint, EventLog, LogEntry};

/// Main context for payments operations
///
/// Wires configuration, storage and the decorated account service together.
/// Transports hold one of these and call `accounts`.
pub struct PaymentsContext {
    pub config: Config,
    pub repository: Arc<dyn Repository>,
    /// Accounts database file, `None` for in-memory contexts
    pub database_path: Option<PathBuf>,
    pub event_log: Option<Arc<EventLog>>,
    pub accounts: Box<dyn AccountService>,
}

impl PaymentsContext {
    /// Open the context stored in `data_dir`
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let database_path = data_dir.join(&config.database_file);
        let repository = DuckDbRepository::new(&database_path, config.log_statements)
            .with_context(|| format!("Failed to open database {:?}", database_path))?;
        repository
            .ensure_schema()
            .context("Failed to initialize database schema")?;

        // An unusable log database disables call logging, never account access
        let event_log = if config.event_log {
            match EventLog::new(data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
                Ok(log) => Some(Arc::new(log)),
                Err(e) => {
                    eprintln!("[payments] Event log disabled: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::assemble(
            config,
            Arc::new(repository),
            Some(database_path),
            event_log,
        ))
    }

    /// Context whose accounts and event log vanish when it is dropped
    pub fn in_memory(entry_point: EntryPoint) -> Result<Self> {
        let event_log = EventLog::open_in_memory(entry_point, env!("CARGO_PKG_VERSION"))?;
        Ok(Self::assemble(
            Config::default(),
            Arc::new(InMemoryRepository::new()),
            None,
            Some(Arc::new(event_log)),
        ))
    }

    fn assemble(
        config: Config,
        repository: Arc<dyn Repository>,
        database_path: Option<PathBuf>,
        event_log: Option<Arc<EventLog>>,
    ) -> Self {
        let accounts = compose_account_service(Arc::clone(&repository), event_log.clone());
        Self {
            config,
            repository,
            database_path,
            event_log,
            accounts,
        }
    }
}

/// Build the account service, wrapped in the logging decorator when an event log is present
pub fn compose_account_service(
    repository: Arc<dyn Repository>,
    event_log: Option<Arc<EventLog>>,
) -> Box<dyn AccountService> {
    let service = AccountManager::new(repository);
    match event_log {
        Some(log) => Box::new(LoggingAccountService::new(service, log)),
        None => Box::new(service),
    }
}
