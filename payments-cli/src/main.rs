//! Payments CLI - manage accounts from your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use payments_core::ErrorKind;

mod commands;
mod output;

use commands::{account, logs, status, Globals};

/// Payments - account service in your terminal
#[derive(Parser)]
#[command(name = "pay", version, about, long_about = None)]
struct Cli {
    /// Directory holding the accounts database, settings and logs
    #[arg(long, global = true, env = "PAYMENTS_DIR")]
    data_dir: Option<PathBuf>,

    /// Use a throwaway in-memory store. Nothing is read from or written to
    /// disk, so every invocation starts with no accounts.
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, inspect and delete accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Show a summary of stored accounts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the call log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

/// Exit status for a failed command
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<payments_core::Error>().map(|e| e.kind()) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Conflict) => 4,
        Some(ErrorKind::Storage) | None => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let globals = Globals::new(cli.data_dir, cli.in_memory);
    match cli.command {
        Commands::Account { command } => account::run(&globals, command),
        Commands::Status { json } => status::run(&globals, json),
        Commands::Logs { command } => logs::run(&globals, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payments_core::AccountId;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_in_memory_help_warns_store_starts_empty() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        let flag = cmd
            .get_arguments()
            .find(|a| a.get_id() == "in_memory")
            .unwrap();
        let help = flag.get_help().unwrap().to_string();
        assert!(help.contains("every invocation starts with no accounts"), "{}", help);
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let id = AccountId::parse("A1").unwrap();
        let validation = anyhow::Error::from(payments_core::Error::validation("bad"));
        let unknown = anyhow::Error::from(payments_core::Error::UnknownAccount(id.clone()));
        let exists = anyhow::Error::from(payments_core::Error::AccountAlreadyExists(id));
        let storage = anyhow::Error::from(payments_core::Error::storage("disk"));
        let other = anyhow::anyhow!("something else");

        assert_eq!(exit_code(&validation), 2);
        assert_eq!(exit_code(&unknown), 3);
        assert_eq!(exit_code(&exists), 4);
        assert_eq!(exit_code(&storage), 1);
        assert_eq!(exit_code(&other), 1);
    }

    #[test]
    fn test_exit_code_survives_context() {
        use anyhow::Context;
        let err: Result<()> = Err::<(), _>(payments_core::Error::validation("bad"))
            .context("Failed to create account");
        assert_eq!(exit_code(&err.unwrap_err()), 2);
    }
}
