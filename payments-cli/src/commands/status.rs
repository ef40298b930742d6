//! Status command - summary of stored accounts

use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

use payments_core::AccountService;

use super::Globals;
use crate::output;

#[derive(Serialize)]
struct Status {
    active_accounts: usize,
    total_balance: Decimal,
    database_path: Option<String>,
    database_size_bytes: Option<u64>,
    event_log_enabled: bool,
    event_log_entries: Option<u64>,
}

pub fn run(globals: &Globals, json: bool) -> Result<()> {
    let ctx = globals.context()?;
    let accounts = ctx.accounts.load_all()?;

    let database_size_bytes = ctx
        .database_path
        .as_ref()
        .and_then(|path| std::fs::metadata(path).ok())
        .map(|m| m.len());
    let event_log_entries = match &ctx.event_log {
        Some(log) => Some(log.count()?),
        None => None,
    };

    let status = Status {
        active_accounts: accounts.len(),
        total_balance: accounts.iter().map(|a| a.balance).sum(),
        database_path: ctx
            .database_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        database_size_bytes,
        event_log_enabled: ctx.event_log.is_some(),
        event_log_entries,
    };

    if json {
        return output::json(&status);
    }

    println!("{}", "Payments Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Active accounts".to_string(), status.active_accounts.to_string()]);
    table.add_row(vec!["Total balance".to_string(), status.total_balance.to_string()]);
    table.add_row(vec![
        "Database".to_string(),
        status
            .database_path
            .clone()
            .unwrap_or_else(|| "(in memory)".to_string()),
    ]);
    if let Some(size) = status.database_size_bytes {
        table.add_row(vec!["Database size".to_string(), output::format_size(size)]);
    }
    table.add_row(vec![
        "Event log".to_string(),
        match status.event_log_entries {
            Some(n) => format!("{} entries", n),
            None => "disabled".to_string(),
        },
    ]);
    println!("{}", table);

    if ctx.config.log_statements {
        println!();
        output::warning("Statement logging is on: SQL is echoed to stderr");
    }

    Ok(())
}
