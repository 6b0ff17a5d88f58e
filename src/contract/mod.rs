//! Contract binding - signer-attached handle to the ATM contract
//!
//! # Calls
//!
//! | Call | Kind | RPC |
//! |------|------|-----|
//! | `fetchBalance()` | read | `eth_call` |
//! | `deposit(uint256)` | write | `eth_sendTransaction` |
//! | `withdraw(uint256)` | write | `eth_sendTransaction` |
//! | `closeAccount()` | write | `eth_sendTransaction` |
//! | `reopenAccount()` | write | `eth_sendTransaction` |
//!
//! Writes return as soon as the transaction is accepted; finality is a separate
//! `await_confirmation` step that polls `eth_getTransactionReceipt`.

pub mod abi;

pub use abi::ContractAbi;

use crate::error::{AtmError, AtmResult};
use crate::wallet::{AccountId, WalletHandle};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Bound reference to the ATM contract. Rebuilt whenever the wallet or account changes.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    wallet: WalletHandle,
    from: AccountId,
    address: Address,
    abi: Arc<ContractAbi>,
}

impl ContractHandle {
    /// Pure construction. Fails without a wallet handle or an account.
    pub fn bind(
        wallet: Option<&WalletHandle>,
        account: Option<&AccountId>,
        address: Address,
        abi: Arc<ContractAbi>,
    ) -> AtmResult<Self> {
        let wallet = wallet.ok_or_else(|| AtmError::Binding("no wallet to sign with".into()))?;
        let from = account.ok_or_else(|| AtmError::Binding("No account found".into()))?;
        Ok(Self { wallet: wallet.clone(), from: from.clone(), address, abi })
    }

    pub fn wallet(&self) -> &WalletHandle { &self.wallet }
}

/// A state-changing contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtmCall {
    Deposit(U256),
    Withdraw(U256),
    CloseAccount,
    ReopenAccount,
}

impl AtmCall {
    pub fn function(&self) -> &'static str {
        match self {
            AtmCall::Deposit(_) => abi::DEPOSIT,
            AtmCall::Withdraw(_) => abi::WITHDRAW,
            AtmCall::CloseAccount => abi::CLOSE_ACCOUNT,
            AtmCall::ReopenAccount => abi::REOPEN_ACCOUNT,
        }
    }

    pub fn args(&self) -> Vec<U256> {
        match self {
            AtmCall::Deposit(v) | AtmCall::Withdraw(v) => vec![*v],
            AtmCall::CloseAccount | AtmCall::ReopenAccount => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtmQuery {
    FetchBalance,
}

impl AtmQuery {
    pub fn function(&self) -> &'static str {
        match self { AtmQuery::FetchBalance => abi::FETCH_BALANCE }
    }
}

/// Submitted, not yet final.
#[derive(Debug, Clone)]
pub struct PendingReceipt {
    pub tx_hash: String,
    pub call: AtmCall,
    wallet: WalletHandle,
}

impl PendingReceipt {
    pub fn new(tx_hash: impl Into<String>, call: AtmCall, wallet: WalletHandle) -> Self {
        Self { tx_hash: tx_hash.into(), call, wallet }
    }

    pub fn wallet(&self) -> &WalletHandle { &self.wallet }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait ContractBinding: Send + Sync {
    fn bind(
        &self,
        wallet: Option<&WalletHandle>,
        account: Option<&AccountId>,
        address: Address,
        abi: Arc<ContractAbi>,
    ) -> AtmResult<ContractHandle> {
        ContractHandle::bind(wallet, account, address, abi)
    }

    /// Submit a write. `Submission` or `UserRejected` on failure.
    async fn invoke(&self, contract: &ContractHandle, call: AtmCall) -> AtmResult<PendingReceipt>;

    /// Wait for the ledger to finalize a submitted write.
    async fn await_confirmation(&self, receipt: &PendingReceipt) -> AtmResult<Confirmed>;

    /// Read-only call; no signing, no confirmation.
    async fn read(&self, contract: &ContractHandle, query: AtmQuery) -> AtmResult<U256>;
}

/// ContractBinding over the wallet's EIP-1193 provider.
#[derive(Debug, Clone)]
pub struct RpcContract {
    poll_interval: Duration,
    timeout: Duration,
}

impl Default for RpcContract {
    fn default() -> Self { Self::new(Duration::from_millis(500), Duration::from_secs(120)) }
}

impl RpcContract {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self { Self { poll_interval, timeout } }

    fn call_object(contract: &ContractHandle, data: &[u8]) -> Value {
        json!({
            "from": contract.from.as_str(),
            "to": contract.address.to_string(),
            "data": abi::to_hex(data),
        })
    }
}

fn quantity(v: &Value) -> Option<u64> {
    let s = v.as_str()?;
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}

#[async_trait]
impl ContractBinding for RpcContract {
    async fn invoke(&self, contract: &ContractHandle, call: AtmCall) -> AtmResult<PendingReceipt> {
        let data = contract.abi.encode(call.function(), &call.args())?;
        let tx = Self::call_object(contract, &data);
        let hash = contract.wallet.provider().request("eth_sendTransaction", json!([tx])).await
            .map_err(AtmError::from_submission_rpc)?;
        let hash = hash.as_str()
            .ok_or_else(|| AtmError::Submission(format!("unexpected transaction hash: {}", hash)))?;
        tracing::info!(function = call.function(), tx = hash, "transaction submitted");
        Ok(PendingReceipt::new(hash, call, contract.wallet.clone()))
    }

    async fn await_confirmation(&self, receipt: &PendingReceipt) -> AtmResult<Confirmed> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let provider = receipt.wallet.provider();
        loop {
            let v = provider.request("eth_getTransactionReceipt", json!([receipt.tx_hash])).await
                .map_err(|e| AtmError::Confirmation(e.message))?;
            if !v.is_null() {
                let block_number = v.get("blockNumber").and_then(quantity);
                return match v.get("status").and_then(quantity) {
                    Some(0) => Err(AtmError::Confirmation("transaction reverted".into())),
                    _ => {
                        tracing::info!(tx = %receipt.tx_hash, ?block_number, "transaction confirmed");
                        Ok(Confirmed { tx_hash: receipt.tx_hash.clone(), block_number })
                    }
                };
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AtmError::Confirmation(format!(
                    "timed out after {}s waiting for {}", self.timeout.as_secs(), receipt.tx_hash
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn read(&self, contract: &ContractHandle, query: AtmQuery) -> AtmResult<U256> {
        let data = contract.abi.encode(query.function(), &[])?;
        let call = Self::call_object(contract, &data);
        let v = contract.wallet.provider().request("eth_call", json!([call, "latest"])).await
            .map_err(|e| AtmError::Read(e.message))?;
        let word = v.as_str().ok_or_else(|| AtmError::Read(format!("unexpected call result: {}", v)))?;
        abi::decode_uint(word).map_err(AtmError::Read)
    }
}
