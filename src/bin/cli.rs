use bankbook::{AccountRegistry, AccountNumber, Amount,
    config::CliConfig};

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{bail, Context};
use colored::Colorize;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to the accounts file to operate on
    #[clap(short, long, value_parser)]
    file: Option<PathBuf>,

    /// TOML config naming the accounts file and log level
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Read and display balances
    Balances(Balances),
    /// Open a new account
    Create(Create),
    /// Pay money into an account
    Deposit(SingleAccount),
    /// Take money out of an account
    Withdraw(SingleAccount),
    /// Move money between two accounts
    Transfer(Transfer)
}

#[derive(Args, Debug)]
struct Balances {
    /// Print the accounts as JSON
    #[clap(long)]
    json: bool
}

#[derive(Args, Debug)]
struct Create {
    /// Name of the account holder
    #[clap(value_parser)]
    name: String,

    #[clap(short='b', long, value_parser, default_value_t = 0.0)]
    balance: Amount
}

#[derive(Args, Debug)]
struct SingleAccount {
    #[clap(value_parser)]
    account: AccountNumber,

    #[clap(value_parser)]
    amount: Amount
}

#[derive(Args, Debug)]
struct Transfer {
    /// Account that pays
    #[clap(short='f', long, value_parser)]
    from: AccountNumber,

    /// Account that gets paid
    #[clap(short='t', long, value_parser)]
    to: AccountNumber,

    #[clap(short='a', long, value_parser)]
    amount: Amount
}

fn print_balances(registry: &AccountRegistry) {
    for account in registry.accounts() {
        let color = if account.balance() > 0.0 {
            colored::ColoredString::green
        } else {
            colored::ColoredString::normal
        };
        let fmt_balance = color(format!("{:.2}", account.balance()).white());
        println!("{:>5} {}: {}", format!("#{}", account.number()).bold(), account.name(), fmt_balance);
    }
}

/// Prints the outcome of a balance change; `false` means nothing changed.
fn report(done: bool, success: String, failure: String) -> bool {
    if done {
        println!("{}", success);
    } else {
        eprintln!("{}", failure.bright_red());
    }
    return done;
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    let config = args.config.as_ref()
        .map(CliConfig::read)
        .transpose()?;

    let log_level = config.as_ref()
        .and_then(|config| config.log_level.clone())
        .unwrap_or_else(|| "warn".to_owned());
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level)
    ).init();

    let path = match (args.file, config) {
        (Some(path), _) => path,
        (None, Some(config)) => config.storage.path,
        (None, None) => bail!("no accounts file given: pass --file or --config")
    };

    let mut registry = AccountRegistry::new();
    registry.load(&path)
        .with_context(|| format!("failed to load accounts from {}", path.display()))?;

    let done = match args.action {
        Subcommands::Balances(balances) => {
            if balances.json {
                let accounts: Vec<_> = registry.accounts().collect();
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else {
                print_balances(&registry);
            }
            return Ok(ExitCode::SUCCESS);
        },
        Subcommands::Create(create) => {
            let number = registry.create_account(&create.name, create.balance)?;
            println!("opened account #{} for {}", number, create.name);
            true
        },
        Subcommands::Deposit(deposit) => {
            let done = registry.deposit(deposit.account, deposit.amount)?;
            report(done,
                format!("deposited {} into #{}", deposit.amount, deposit.account),
                format!("no such account: #{}", deposit.account))
        },
        Subcommands::Withdraw(withdraw) => {
            let done = registry.withdraw(withdraw.account, withdraw.amount)?;
            report(done,
                format!("withdrew {} from #{}", withdraw.amount, withdraw.account),
                format!("cannot withdraw {} from #{}: no such account or insufficient funds", withdraw.amount, withdraw.account))
        },
        Subcommands::Transfer(transfer) => {
            let done = registry.transfer(transfer.from, transfer.to, transfer.amount)?;
            report(done,
                format!("transferred {} from #{} to #{}", transfer.amount, transfer.from, transfer.to),
                format!("cannot transfer {} from #{} to #{}: no such account or insufficient funds", transfer.amount, transfer.from, transfer.to))
        }
    };

    if !done {
        return Ok(ExitCode::FAILURE);
    }
    registry.save(&path)
        .with_context(|| format!("failed to save accounts to {}", path.display()))?;
    return Ok(ExitCode::SUCCESS);
}
