//! Atmnode: drive a ledger-backed ATM account through a wallet provider.
//!
//! # Architecture
//!
//! ```text
//! Front-end (CLI / view::render)
//!   │  intents: connect, deposit, withdraw, balance, close, reopen
//!   ▼
//! AtmSession (state machine: Unconnected / Open / Closed + status line)
//!   │
//!   ├── WalletGateway ──── discover, current_accounts, request_accounts
//!   ├── ContractBinding ── bind, invoke, await_confirmation, read
//!   └── BalanceCache ───── unknown until fetched, cleared by every write
//!                 │
//!                 ▼
//!            rpc::Eip1193 (injected provider / HttpProvider)
//! ```
//!
//! # Features
//!
//! - `native` - HTTP JSON-RPC provider, log subscriber, CLI binary
//!
//! # Usage
//!
//! ```ignore
//! use atmnode::{AtmConfig, AtmSession, HttpProvider, InjectedWallet, RpcContract};
//! use std::sync::Arc;
//!
//! let config = AtmConfig::new().with_rpc_url("http://127.0.0.1:8545");
//! let provider = Arc::new(HttpProvider::new(config.rpc_url.clone()));
//! let session = AtmSession::new(
//!     Arc::new(InjectedWallet::new(provider)),
//!     Arc::new(RpcContract::new(config.poll_interval, config.confirm_timeout)),
//!     config,
//! );
//!
//! session.start().await?;
//! session.connect().await?;
//! session.deposit("1.5").await?;
//! let balance = session.fetch_balance().await?;
//! ```

pub mod balance;
pub mod config;
pub mod contract;
pub mod error;
pub mod rpc;
pub mod session;
pub mod units;
pub mod view;
pub mod wallet;

#[cfg(feature = "native")]
pub mod logging;

pub use balance::{BalanceCache, BalanceSnapshot};
pub use config::AtmConfig;
pub use contract::{AtmCall, AtmQuery, Confirmed, ContractAbi, ContractBinding, ContractHandle, PendingReceipt, RpcContract};
pub use error::{AtmError, AtmResult};
pub use rpc::{Eip1193, RpcError};
pub use session::{AccountState, AtmSession, InFlight, Operation, SessionSnapshot, Submission};
pub use units::{format_units, parse_units, EthAmount};
pub use view::{render, ViewModel};
pub use wallet::{AccountId, InjectedWallet, WalletGateway, WalletHandle};

#[cfg(feature = "native")]
pub use rpc::HttpProvider;
