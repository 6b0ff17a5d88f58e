//! InjectedWallet - WalletGateway over an EIP-1193 provider slot

use super::{AccountId, WalletGateway, WalletHandle};
use crate::error::{AtmError, AtmResult};
use crate::rpc::Eip1193;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Wallet gateway backed by whatever provider was injected at startup.
/// An empty slot behaves like a page with no wallet extension.
pub struct InjectedWallet {
    injected: Option<Arc<dyn Eip1193>>,
}

impl InjectedWallet {
    pub fn new(provider: Arc<dyn Eip1193>) -> Self { Self { injected: Some(provider) } }
    pub fn absent() -> Self { Self { injected: None } }
}

fn parse_accounts(value: Value) -> AtmResult<Vec<AccountId>> {
    let list = value.as_array()
        .ok_or_else(|| AtmError::Binding(format!("unexpected accounts response: {}", value)))?;
    Ok(list.iter().filter_map(|v| v.as_str()).map(AccountId::new).collect())
}

fn parse_quantity(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}

#[async_trait]
impl WalletGateway for InjectedWallet {
    async fn discover(&self) -> Option<WalletHandle> {
        let provider = self.injected.as_ref()?;
        match provider.request("eth_chainId", json!([])).await {
            Ok(v) => {
                let chain_id = parse_quantity(&v).unwrap_or_default();
                tracing::info!(chain_id, "wallet discovered");
                Some(WalletHandle::new(provider.clone(), chain_id))
            }
            Err(e) => {
                tracing::warn!("wallet provider did not answer: {}", e);
                None
            }
        }
    }

    async fn current_accounts(&self, handle: &WalletHandle) -> AtmResult<Vec<AccountId>> {
        let v = handle.provider().request("eth_accounts", json!([])).await
            .map_err(AtmError::from_wallet_rpc)?;
        parse_accounts(v)
    }

    async fn request_accounts(&self, handle: Option<&WalletHandle>) -> AtmResult<Vec<AccountId>> {
        let handle = handle.ok_or(AtmError::NoWallet)?;
        let provider = handle.provider();
        let v = match provider.request("eth_requestAccounts", json!([])).await {
            Ok(v) => v,
            // Plain node endpoints have no approval flow; their unlocked accounts are the answer.
            Err(e) if e.is_unsupported() => {
                tracing::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                provider.request("eth_accounts", json!([])).await.map_err(AtmError::from_wallet_rpc)?
            }
            Err(e) => return Err(AtmError::from_wallet_rpc(e)),
        };
        let accounts = parse_accounts(v)?;
        tracing::info!(count = accounts.len(), "accounts authorized");
        Ok(accounts)
    }
}
