//! Wallet module - discovery and account authorization
//!
//! # Architecture
//!
//! ```text
//! WalletGateway (trait)
//!     │
//!     ├── discover()          → WalletHandle | None   (eth_chainId probe, no prompt)
//!     ├── current_accounts()  → [AccountId]           (eth_accounts, passive)
//!     └── request_accounts()  → [AccountId]           (eth_requestAccounts, prompts)
//!                                   │
//!                                   ▼
//!                             InjectedWallet
//!                                   │
//!                                   ▼
//!                              rpc::Eip1193
//! ```
//!
//! Errors are never retried here; they surface to the session as-is.

mod injected;

pub use injected::InjectedWallet;

use crate::error::AtmResult;
use crate::rpc::Eip1193;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Externally-owned account identifier as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self { Self::new(s) }
}

/// The discovered wallet capability. Cheap to clone; all clones share the provider.
#[derive(Clone)]
pub struct WalletHandle {
    provider: Arc<dyn Eip1193>,
    chain_id: u64,
}

impl WalletHandle {
    pub fn new(provider: Arc<dyn Eip1193>, chain_id: u64) -> Self { Self { provider, chain_id } }
    pub fn provider(&self) -> &Arc<dyn Eip1193> { &self.provider }
    pub fn chain_id(&self) -> u64 { self.chain_id }
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle").field("chain_id", &self.chain_id).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Detect the injected capability. Never prompts; idempotent.
    async fn discover(&self) -> Option<WalletHandle>;

    /// Accounts already authorized for this origin. May be empty.
    async fn current_accounts(&self, handle: &WalletHandle) -> AtmResult<Vec<AccountId>>;

    /// Ask the user to authorize an account. `NoWallet` without a handle,
    /// `UserRejected` when declined.
    async fn request_accounts(&self, handle: Option<&WalletHandle>) -> AtmResult<Vec<AccountId>>;
}
