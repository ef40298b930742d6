//! CLI command implementations

pub mod account;
pub mod logs;
pub mod status;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use payments_core::{EntryPoint, EventLog, PaymentsContext};

/// Options shared by every command
pub struct Globals {
    data_dir: Option<PathBuf>,
    in_memory: bool,
}

impl Globals {
    pub fn new(data_dir: Option<PathBuf>, in_memory: bool) -> Self {
        Self { data_dir, in_memory }
    }

    /// Data directory from `--data-dir` / `PAYMENTS_DIR`, or `~/.payments`
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".payments"))
                .ok_or_else(|| anyhow!("Could not find home directory, pass --data-dir")),
        }
    }

    /// Open the payments context, creating the data directory on first use
    pub fn context(&self) -> Result<PaymentsContext> {
        if self.in_memory {
            return PaymentsContext::in_memory(EntryPoint::Cli);
        }

        let data_dir = self.ensure_data_dir()?;
        PaymentsContext::new(&data_dir, EntryPoint::Cli)
            .context("Failed to initialize payments context")
    }

    /// Open only the event log, without touching the accounts database
    pub fn event_log(&self) -> Result<EventLog> {
        if self.in_memory {
            return EventLog::open_in_memory(EntryPoint::Cli, env!("CARGO_PKG_VERSION"));
        }

        let data_dir = self.ensure_data_dir()?;
        EventLog::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
    }

    fn ensure_data_dir(&self) -> Result<PathBuf> {
        let data_dir = self.data_dir()?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
        Ok(data_dir)
    }
}
