//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "database": { "file": "payments.duckdb", "logStatements": false },
//!   "eventLog": { "enabled": true }
//! }
//! ```
//! Unknown keys are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default accounts database file name
pub const DEFAULT_DB_FILENAME: &str = "payments.duckdb";

/// Environment override for statement logging
pub const ENV_DB_LOG: &str = "PAYMENTS_DB_LOG";

/// Environment override for the call event log
pub const ENV_EVENT_LOG: &str = "PAYMENTS_EVENT_LOG";

/// Raw settings.json structure
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    database: DatabaseSettings,
    #[serde(default)]
    event_log: EventLogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSettings {
    #[serde(default = "default_db_file")]
    file: String,
    #[serde(default)]
    log_statements: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            file: default_db_file(),
            log_statements: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventLogSettings {
    #[serde(default = "default_true")]
    enabled: bool,
}

impl Default for EventLogSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_db_file() -> String {
    DEFAULT_DB_FILENAME.to_string()
}

fn default_true() -> bool {
    true
}

/// Parse a boolean environment flag, falling back to `default` when unset or unrecognized
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
        Some("false" | "0" | "no" | "FALSE" | "NO") => false,
        _ => default,
    }
}

/// Payments configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Accounts database file name, relative to the data directory
    pub database_file: String,
    /// Echo every SQL statement to stderr
    pub log_statements: bool,
    /// Record service calls in logs.duckdb
    pub event_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            database_file: raw.database.file,
            log_statements: raw.database.log_statements,
            event_log: raw.event_log.enabled,
        }
    }

    /// Load config from the data directory
    ///
    /// A missing settings file yields defaults. `PAYMENTS_DB_LOG` and
    /// `PAYMENTS_EVENT_LOG` override the file.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file: {:?}", settings_path))?
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_settings(raw);
        config.log_statements =
            parse_flag(std::env::var(ENV_DB_LOG).ok().as_deref(), config.log_statements);
        config.event_log =
            parse_flag(std::env::var(ENV_EVENT_LOG).ok().as_deref(), config.event_log);
        Ok(config)
    }
}
