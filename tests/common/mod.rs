//! Shared fixtures: an in-memory ledger behind EIP-1193 and a scripted contract double.

#![allow(dead_code)]

use alloy_primitives::U256;
use async_trait::async_trait;
use atmnode::contract::abi::Function;
use atmnode::{
    AtmCall, AtmConfig, AtmError, AtmQuery, AtmResult, AtmSession, Confirmed, ContractBinding,
    ContractHandle, Eip1193, InjectedWallet, PendingReceipt, RpcContract, RpcError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const OWNER: &str = "0xABC";

pub fn eth(s: &str) -> U256 {
    atmnode::parse_units(s, 18).expect("amount")
}

#[derive(Default)]
pub struct LedgerState {
    pub chain_id: u64,
    /// Returned by `eth_accounts` (already authorized).
    pub authorized: Vec<String>,
    /// Returned by `eth_requestAccounts` once approved.
    pub wallet_accounts: Vec<String>,
    pub reject_connect: bool,
    pub reject_signing: bool,
    pub revert_on_confirm: bool,
    pub withhold_receipts: bool,
    pub read_failure: Option<String>,
    pub balance: U256,
    pub closed: bool,
    pub receipts: HashMap<String, bool>,
    pub block: u64,
    pub calls: Vec<String>,
}

/// Wallet + node + ATM contract in one process.
pub struct FakeLedger {
    pub state: Mutex<LedgerState>,
}

impl FakeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LedgerState {
                chain_id: 31337,
                wallet_accounts: vec![OWNER.to_string()],
                block: 1,
                ..Default::default()
            }),
        })
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self, method: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|m| *m == method).count())
    }

    pub fn writes(&self) -> usize {
        self.calls("eth_sendTransaction")
    }

    fn revert(reason: &str) -> RpcError {
        RpcError::new(-32603, format!("execution reverted: {}", reason))
    }

    fn send(state: &mut LedgerState, tx: &Value) -> Result<Value, RpcError> {
        if state.reject_signing {
            return Err(RpcError::user_rejected());
        }
        if tx["from"].as_str() != Some(OWNER) {
            return Err(Self::revert("You are not the owner of this account"));
        }
        let data = tx["data"].as_str().unwrap_or_default();
        let data = hex::decode(data.trim_start_matches("0x")).map_err(|e| RpcError::internal(e.to_string()))?;
        let (selector, args) = data.split_at(4);
        let amount = if args.len() >= 32 { U256::from_be_slice(&args[..32]) } else { U256::ZERO };

        let is = |name: &str, inputs: &[&str]| Function::new(name, inputs).selector == selector;
        let (balance, closed) = if is("deposit", &["uint256"]) {
            if state.closed { return Err(Self::revert("Account is closed")); }
            (state.balance + amount, false)
        } else if is("withdraw", &["uint256"]) {
            if state.closed { return Err(Self::revert("Account is closed")); }
            if state.balance < amount { return Err(Self::revert("Insufficient balance")); }
            (state.balance - amount, false)
        } else if is("closeAccount", &[]) {
            if state.closed { return Err(Self::revert("Account already closed")); }
            (state.balance, true)
        } else if is("reopenAccount", &[]) {
            if !state.closed { return Err(Self::revert("Account is not closed")); }
            (state.balance, false)
        } else {
            return Err(Self::revert("unknown selector"));
        };

        let ok = !state.revert_on_confirm;
        if ok {
            state.balance = balance;
            state.closed = closed;
        }
        let hash = format!("0x{:064x}", state.receipts.len() + 1);
        state.receipts.insert(hash.clone(), ok);
        Ok(json!(hash))
    }
}

#[async_trait]
impl Eip1193 for FakeLedger {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        match method {
            "eth_chainId" => Ok(json!(format!("0x{:x}", state.chain_id))),
            "eth_accounts" => Ok(json!(state.authorized)),
            "eth_requestAccounts" => {
                if state.reject_connect {
                    return Err(RpcError::user_rejected());
                }
                state.authorized = state.wallet_accounts.clone();
                Ok(json!(state.authorized))
            }
            "eth_sendTransaction" => Self::send(&mut state, &params[0]),
            "eth_getTransactionReceipt" => {
                if state.withhold_receipts {
                    return Ok(Value::Null);
                }
                let hash = params[0].as_str().unwrap_or_default();
                let Some(ok) = state.receipts.get(hash).copied() else { return Ok(Value::Null) };
                state.block += 1;
                Ok(json!({
                    "transactionHash": hash,
                    "blockNumber": format!("0x{:x}", state.block),
                    "status": if ok { "0x1" } else { "0x0" },
                }))
            }
            "eth_call" => {
                if let Some(msg) = &state.read_failure {
                    return Err(RpcError::new(-32000, msg.clone()));
                }
                Ok(json!(format!("0x{}", hex::encode(state.balance.to_be_bytes::<32>()))))
            }
            _ => Err(RpcError::new(-32601, format!("the method {} does not exist/is not available", method))),
        }
    }
}

pub fn fast_config() -> AtmConfig {
    AtmConfig::new().with_confirmation(Duration::from_millis(2), Duration::from_millis(200))
}

/// Session over the fake ledger with the real wallet gateway and contract binding.
pub fn ledger_session(ledger: &Arc<FakeLedger>) -> AtmSession {
    let config = fast_config();
    let contract = RpcContract::new(config.poll_interval, config.confirm_timeout);
    AtmSession::new(Arc::new(InjectedWallet::new(ledger.clone())), Arc::new(contract), config)
}

/// Contract double: reads return queued values and can be held behind a gate.
#[derive(Default)]
pub struct ScriptedContract {
    pub read_values: Mutex<Vec<U256>>,
    pub read_gate: Option<Arc<Semaphore>>,
    pub reads_started: AtomicUsize,
    pub reads_finished: AtomicUsize,
    pub invokes: AtomicUsize,
    pub confirmation_error: Mutex<Option<String>>,
}

impl ScriptedContract {
    pub fn gated(values: Vec<U256>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let double = Self {
            read_values: Mutex::new(values),
            read_gate: Some(gate.clone()),
            ..Default::default()
        };
        (Arc::new(double), gate)
    }

    pub fn reads_started(&self) -> usize { self.reads_started.load(Ordering::SeqCst) }
    pub fn reads_finished(&self) -> usize { self.reads_finished.load(Ordering::SeqCst) }
}

#[async_trait]
impl ContractBinding for ScriptedContract {
    async fn invoke(&self, contract: &ContractHandle, call: AtmCall) -> AtmResult<PendingReceipt> {
        let n = self.invokes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PendingReceipt::new(format!("0x{:02x}", n), call, contract.wallet().clone()))
    }

    async fn await_confirmation(&self, receipt: &PendingReceipt) -> AtmResult<Confirmed> {
        match self.confirmation_error.lock().unwrap().clone() {
            Some(msg) => Err(AtmError::Confirmation(msg)),
            None => Ok(Confirmed { tx_hash: receipt.tx_hash.clone(), block_number: Some(7) }),
        }
    }

    async fn read(&self, _contract: &ContractHandle, _query: AtmQuery) -> AtmResult<U256> {
        self.reads_started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.read_gate {
            gate.acquire().await.map_err(|e| AtmError::Read(e.to_string()))?.forget();
        }
        let value = {
            let mut values = self.read_values.lock().unwrap();
            if values.is_empty() { U256::ZERO } else { values.remove(0) }
        };
        self.reads_finished.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

/// Session with the real wallet gateway over `ledger` and a contract double.
pub fn scripted_session(ledger: &Arc<FakeLedger>, contract: Arc<ScriptedContract>) -> AtmSession {
    AtmSession::new(Arc::new(InjectedWallet::new(ledger.clone())), contract, fast_config())
}

pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
