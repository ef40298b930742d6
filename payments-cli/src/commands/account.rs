//! Account commands - create, show, list and delete accounts

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use rust_decimal::Decimal;
use serde::Serialize;

use payments_core::domain::result::Result as CoreResult;
use payments_core::{Account, AccountId, AccountService, NewAccountRequest, OperationResult};

use super::Globals;
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    New {
        /// Account ID (ASCII letters and digits, up to 255 characters)
        id: String,
        /// Currency code
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Opening balance, zero when omitted
        #[arg(long)]
        balance: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one active account
    Show {
        /// Account ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all active accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an account (it stays on record, hidden from reads)
    Delete {
        /// Account ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Deleted {
    id: AccountId,
}

pub fn run(globals: &Globals, command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::New {
            id,
            currency,
            balance,
            json,
        } => {
            let mut request = NewAccountRequest::new(id, currency);
            if let Some(balance) = balance {
                request = request.with_balance(balance);
            }
            run_new(globals, &request, json)
        }
        AccountCommands::Show { id, json } => run_show(globals, &id, json),
        AccountCommands::List { json } => run_list(globals, json),
        AccountCommands::Delete { id, force, json } => run_delete(globals, &id, force, json),
    }
}

/// Print `result` as JSON or hand it to `render`, then surface any error for the exit code
fn finish<T: Serialize>(
    json: bool,
    result: CoreResult<T>,
    render: impl FnOnce(&T),
) -> Result<()> {
    match result {
        Ok(data) => {
            if json {
                output::json(&OperationResult::ok(data))?;
            } else {
                render(&data);
            }
            Ok(())
        }
        Err(e) => {
            if json {
                output::json(&OperationResult::<T>::from_error(&e))?;
            }
            Err(e.into())
        }
    }
}

fn run_new(globals: &Globals, request: &NewAccountRequest, json: bool) -> Result<()> {
    // Reject malformed input before the database is opened
    let (id, currency, balance) = match request.validate() {
        Ok(fields) => fields,
        Err(e) => return finish::<Account>(json, Err(e), |_| {}),
    };

    let ctx = globals.context()?;
    let result = ctx
        .accounts
        .create(id.clone(), currency, balance)
        .map(|()| Account::new(id, currency, balance));

    finish(json, result, |account| {
        output::success(&format!("Account {} created", account.id));
        println!("  Currency: {}", account.currency);
        println!("  Balance: {}", account.balance);
    })
}

fn run_show(globals: &Globals, id: &str, json: bool) -> Result<()> {
    let id = match AccountId::parse(id) {
        Ok(id) => id,
        Err(e) => return finish::<Account>(json, Err(e), |_| {}),
    };

    let ctx = globals.context()?;
    finish(json, ctx.accounts.load(&id), |account| {
        let mut table = output::create_table();
        table.add_row(vec!["ID", account.id.as_str()]);
        table.add_row(vec!["Currency", account.currency.code()]);
        table.add_row(vec!["Balance".to_string(), account.balance.to_string()]);
        println!("{}", table);
    })
}

fn run_list(globals: &Globals, json: bool) -> Result<()> {
    let ctx = globals.context()?;
    finish(json, ctx.accounts.load_all(), |accounts| {
        if accounts.is_empty() {
            println!("No accounts found.");
            return;
        }

        let mut table = output::create_table();
        table.set_header(vec!["ID", "Currency", "Balance"]);
        for account in accounts {
            table.add_row(vec![
                account.id.to_string(),
                account.currency.to_string(),
                account.balance.to_string(),
            ]);
        }
        println!("{}", table);

        let total: Decimal = accounts.iter().map(|a| a.balance).sum();
        println!(
            "{} account(s), total balance {}",
            accounts.len(),
            total.to_string().bold()
        );
    })
}

fn run_delete(globals: &Globals, id: &str, force: bool, json: bool) -> Result<()> {
    let id = match AccountId::parse(id) {
        Ok(id) => id,
        Err(e) => return finish::<Deleted>(json, Err(e), |_| {}),
    };

    if !force && !json {
        println!(
            "\n{}",
            format!("This will delete account '{}'.", id).yellow()
        );
        println!("{}\n", "The record is kept but no longer readable.".dimmed());

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            output::warning("Cancelled");
            return Ok(());
        }
    }

    let ctx = globals.context()?;
    let result = ctx.accounts.delete(&id).map(|()| Deleted { id });

    finish(json, result, |deleted| {
        output::success(&format!("Account {} deleted", deleted.id));
    })
}
