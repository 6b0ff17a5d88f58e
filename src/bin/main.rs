//! Atmnode CLI - terminal front-end for the ATM session
//!
//! One-shot:
//!   atmnode status                → discover wallet, show the account panel
//!   atmnode connect               → request an account
//!   atmnode deposit 1.5           → deposit and wait for confirmation
//!   atmnode withdraw 0.25
//!   atmnode balance
//!   atmnode close | reopen
//!
//! Interactive (default):
//!   atmnode repl                  → same verbs at a prompt; writes confirm in
//!                                   the background so `balance` stays usable
//!
//! Configuration (flag > env > .env > default):
//!   --rpc-url   ATM_RPC_URL           http://127.0.0.1:8545
//!   --contract  ATM_CONTRACT_ADDRESS  0x5FbDB2315678afecb367f032d93F642f64180aa3
//!   --abi       ATM_ABI_PATH          built-in ATM ABI
//!   --owner     ATM_OWNER
//!
//! Output: human panel by default, `--json` for the view model as JSON.

use anyhow::{Context, Result};
use atmnode::logging::{init_logging_with, LogFormat};
use atmnode::{
    render, AtmConfig, AtmSession, HttpProvider, InjectedWallet, Operation, RpcContract, ViewModel,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "atmnode", version, about = "Operate a ledger-backed ATM account through a wallet")]
struct Cli {
    /// JSON-RPC endpoint of the wallet / node.
    #[arg(long, env = "ATM_RPC_URL", default_value = atmnode::config::DEFAULT_RPC_URL)]
    rpc_url: String,

    /// ATM contract address.
    #[arg(long = "contract", env = "ATM_CONTRACT_ADDRESS", default_value = atmnode::config::DEFAULT_CONTRACT_ADDRESS)]
    contract_address: String,

    /// Hardhat artifact holding the contract ABI.
    #[arg(long = "abi", env = "ATM_ABI_PATH")]
    abi_path: Option<PathBuf>,

    /// Owner name shown on the account panel.
    #[arg(long, env = "ATM_OWNER")]
    owner: Option<String>,

    /// Seconds to wait for a transaction to confirm.
    #[arg(long, env = "ATM_CONFIRM_TIMEOUT_SECS", default_value_t = 120)]
    confirm_timeout: u64,

    /// Receipt poll interval in milliseconds.
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// Print the view model as JSON.
    #[arg(long)]
    json: bool,

    /// Log as JSON lines on stderr (also `ATM_LOG_JSON=1`).
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Interactive prompt.
    Repl,
    /// Show the current panel.
    Status,
    Connect,
    Deposit { amount: String },
    Withdraw { amount: String },
    /// Fetch the account balance.
    Balance,
    Close,
    Reopen,
}

/// Export `KEY=value` lines from `.env` without overriding the environment.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}

fn build_config(cli: &Cli) -> Result<AtmConfig> {
    let mut config = AtmConfig::new()
        .with_rpc_url(&cli.rpc_url)
        .with_contract_address(AtmConfig::parse_address(&cli.contract_address)?)
        .with_confirmation(Duration::from_millis(cli.poll_ms), Duration::from_secs(cli.confirm_timeout));
    if let Some(path) = &cli.abi_path {
        config = config.with_abi_file(path)?;
    }
    if let Some(owner) = &cli.owner {
        config = config.with_owner(owner);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    let format = if cli.log_json { LogFormat::Json } else { LogFormat::from_env() };
    init_logging_with(format, "warn");

    let config = build_config(&cli).context("invalid configuration")?;
    let provider = Arc::new(HttpProvider::new(config.rpc_url.clone()));
    tracing::info!(url = provider.url(), contract = %config.contract_address, "using JSON-RPC endpoint");
    let contract = Arc::new(RpcContract::new(config.poll_interval, config.confirm_timeout));
    let session = AtmSession::new(Arc::new(InjectedWallet::new(provider)), contract, config);

    // Absence is rendered by the panel; nothing else to do here.
    let _ = session.start().await;

    match cli.command.clone().unwrap_or(Command::Repl) {
        Command::Repl => repl(&session, cli.json).await,
        command => {
            let ok = run_once(&session, command).await;
            print_view(&session, cli.json)?;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Run a single verb, connecting first when the verb needs an account.
async fn run_once(session: &AtmSession, command: Command) -> bool {
    let needs_account = !matches!(command, Command::Status | Command::Connect | Command::Repl);
    if needs_account && !session.state().is_connected() && session.connect().await.is_err() {
        return false;
    }
    match command {
        Command::Status | Command::Repl => true,
        Command::Connect => session.connect().await.is_ok(),
        Command::Deposit { amount } => session.deposit(amount).await.is_ok(),
        Command::Withdraw { amount } => session.withdraw(amount).await.is_ok(),
        Command::Balance => session.fetch_balance().await.is_ok(),
        Command::Close => session.close_account().await.is_ok(),
        Command::Reopen => session.reopen_account().await.is_ok(),
    }
}

async fn repl(session: &AtmSession, json: bool) -> Result<()> {
    print_view(session, json)?;
    println!("commands: connect | deposit <eth> | withdraw <eth> | balance | close | reopen | status | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next().unwrap_or_default().to_string();
        match verb {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "status" | "show" => {}
            "connect" => { let _ = session.connect().await; }
            "balance" => { let _ = session.fetch_balance().await; }
            "deposit" => { session.set_deposit_amount(arg); submit_in_background(session, Operation::Deposit).await; }
            "withdraw" => { session.set_withdraw_amount(arg); submit_in_background(session, Operation::Withdraw).await; }
            "close" => submit_in_background(session, Operation::CloseAccount).await,
            "reopen" => submit_in_background(session, Operation::ReopenAccount).await,
            other => {
                println!("unknown command: {}", other);
                continue;
            }
        }
        print_view(session, json)?;
    }
    Ok(())
}

/// Submit now (so wallet prompts and rejections surface immediately) and wait
/// for confirmation on a background task.
async fn submit_in_background(session: &AtmSession, op: Operation) {
    let Ok(submission) = session.submit(op).await else { return };
    let session = session.clone();
    tokio::spawn(async move {
        let tx = submission.receipt.tx_hash.clone();
        match session.confirm(submission).await {
            Ok(c) => println!("\n[{}] confirmed {} in block {:?}", op.label(), tx, c.block_number),
            Err(e) => println!("\n[{}] {}", op.label(), e),
        }
    });
}

fn print_view(session: &AtmSession, json: bool) -> Result<()> {
    let view = render(&session.snapshot(), session.config().owner.as_deref());
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    match view {
        ViewModel::WalletRequired { message } | ViewModel::ConnectPrompt { message } => println!("{}", message),
        ViewModel::Closed { account, notice, status } => {
            println!("Your Account: {}", account);
            println!("{}", notice);
            if let Some(status) = status { println!("{}", status); }
        }
        ViewModel::Open { account, owner, deposit_amount, withdraw_amount, status, balance_line, pending_line } => {
            println!("Your Account: {}", account);
            if let Some(owner) = owner { println!("Owner Name: {}", owner); }
            if !deposit_amount.is_empty() { println!("Deposit Amount (ETH): {}", deposit_amount); }
            if !withdraw_amount.is_empty() { println!("Withdraw Amount (ETH): {}", withdraw_amount); }
            if let Some(status) = status { println!("{}", status); }
            if let Some(balance) = balance_line { println!("{}", balance); }
            if let Some(pending) = pending_line { println!("{}", pending); }
        }
    }
    Ok(())
}
