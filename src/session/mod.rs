//! AtmSession - the connection/session state machine
//!
//! ```text
//!                 connect
//!   Unconnected ──────────▶ Open ◀──────────┐
//!                           │  ▲            │ reopen
//!          deposit/withdraw │  │            │
//!                           ▼  │   close    │
//!                           Open ────────▶ Closed
//! ```
//!
//! Every mutating operation runs submit → optimistic update → await
//! confirmation → finalize. The lifecycle transition and cache invalidation
//! happen at submission; a later confirmation failure rewrites the status line
//! but never rolls the lifecycle back.
//!
//! Errors are returned to the caller *and* written to the status line, which is
//! the only error channel the front-end renders.

mod operation;

pub use operation::{
    AccountState, InFlight, Operation, BUSY, CLOSED_NOTICE, CONNECT_REQUIRED,
    REOPEN_REQUIRES_CLOSED, WALLET_REQUIRED,
};

use crate::balance::{BalanceCache, BalanceSnapshot};
use crate::config::AtmConfig;
use crate::contract::{AtmCall, AtmQuery, Confirmed, ContractBinding, ContractHandle, PendingReceipt};
use crate::error::{AtmError, AtmResult};
use crate::units::{format_units, parse_units, EthAmount};
use crate::wallet::{AccountId, WalletGateway, WalletHandle};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Observable session state, the sole input of [`crate::view::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub wallet_detected: bool,
    pub chain_id: Option<u64>,
    pub account: Option<AccountId>,
    pub state: AccountState,
    pub status: String,
    pub balance: BalanceSnapshot,
    pub deposit_amount: String,
    pub withdraw_amount: String,
    pub in_flight: Option<InFlight>,
}

/// A submitted operation awaiting [`AtmSession::confirm`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub operation: Operation,
    pub receipt: PendingReceipt,
}

struct SessionInner {
    wallet: Option<WalletHandle>,
    account: Option<AccountId>,
    contract: Option<ContractHandle>,
    state: AccountState,
    status: String,
    balance: BalanceCache,
    deposit_amount: String,
    withdraw_amount: String,
    in_flight: Option<InFlight>,
}

impl SessionInner {
    /// Wallet-presence guard shared by every entry point except connect.
    fn require_connection(&mut self) -> AtmResult<ContractHandle> {
        if self.wallet.is_none() {
            self.status = WALLET_REQUIRED.into();
            return Err(AtmError::NoWallet);
        }
        match (&self.account, &self.contract) {
            (Some(_), Some(contract)) if self.state.is_connected() => Ok(contract.clone()),
            _ => {
                self.status = CONNECT_REQUIRED.into();
                Err(AtmError::InvalidTransition(CONNECT_REQUIRED.into()))
            }
        }
    }

    fn amount_input(&mut self, op: Operation) -> &mut String {
        match op {
            Operation::Withdraw => &mut self.withdraw_amount,
            _ => &mut self.deposit_amount,
        }
    }

    fn fail(&mut self, op: Operation, err: AtmError) -> AtmError {
        self.status = op.failed_status(&err);
        err
    }
}

/// Single-account ATM session. Clones share state.
#[derive(Clone)]
pub struct AtmSession {
    wallet: Arc<dyn WalletGateway>,
    contract: Arc<dyn ContractBinding>,
    config: Arc<AtmConfig>,
    inner: Arc<Mutex<SessionInner>>,
}

impl AtmSession {
    pub fn new(wallet: Arc<dyn WalletGateway>, contract: Arc<dyn ContractBinding>, config: AtmConfig) -> Self {
        let inner = SessionInner {
            wallet: None,
            account: None,
            contract: None,
            state: AccountState::Unconnected,
            status: String::new(),
            balance: BalanceCache::new(config.decimals),
            deposit_amount: String::new(),
            withdraw_amount: String::new(),
            in_flight: None,
        };
        Self { wallet, contract, config: Arc::new(config), inner: Arc::new(Mutex::new(inner)) }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn config(&self) -> &AtmConfig { &self.config }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.lock();
        SessionSnapshot {
            wallet_detected: s.wallet.is_some(),
            chain_id: s.wallet.as_ref().map(|w| w.chain_id()),
            account: s.account.clone(),
            state: s.state,
            status: s.status.clone(),
            balance: s.balance.get(),
            deposit_amount: s.deposit_amount.clone(),
            withdraw_amount: s.withdraw_amount.clone(),
            in_flight: s.in_flight.clone(),
        }
    }

    pub fn state(&self) -> AccountState { self.lock().state }
    pub fn status(&self) -> String { self.lock().status.clone() }
    pub fn balance(&self) -> BalanceSnapshot { self.lock().balance.get() }

    pub fn set_deposit_amount(&self, amount: impl Into<String>) { self.lock().deposit_amount = amount.into(); }
    pub fn set_withdraw_amount(&self, amount: impl Into<String>) { self.lock().withdraw_amount = amount.into(); }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Startup probe: discover the wallet and, when an account is already
    /// authorized, bind to it without prompting. A no-op once connected.
    pub async fn start(&self) -> AtmResult<AccountState> {
        {
            let s = self.lock();
            if s.in_flight.is_some() {
                return Err(AtmError::InvalidTransition(BUSY.into()));
            }
            if s.state.is_connected() {
                return Ok(s.state);
            }
        }
        let Some(handle) = self.wallet.discover().await else {
            tracing::warn!("no wallet provider discovered");
            self.lock().wallet = None;
            return Err(AtmError::NoWallet);
        };
        self.lock().wallet = Some(handle.clone());

        let accounts = match self.wallet.current_accounts(&handle).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!("reading authorized accounts failed: {}", e);
                return Ok(self.state());
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            tracing::info!("no account authorized yet");
            return Ok(self.state());
        };
        self.attach(&handle, account).map(|_| AccountState::Open)
    }

    /// Ask the wallet for an account and bind the contract to it.
    pub async fn connect(&self) -> AtmResult<AccountId> {
        let handle = {
            let mut s = self.lock();
            if s.in_flight.is_some() {
                s.status = format!("Connection Failed: {}", BUSY);
                return Err(AtmError::InvalidTransition(BUSY.into()));
            }
            match s.wallet.clone() {
                Some(h) => h,
                None => {
                    s.status = WALLET_REQUIRED.into();
                    return Err(AtmError::NoWallet);
                }
            }
        };

        let accounts = match self.wallet.request_accounts(Some(&handle)).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!("account request failed: {}", e);
                self.lock().status = format!("Connection Failed: {}", e);
                return Err(e);
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            let err = AtmError::Binding("No account found".into());
            tracing::warn!("wallet returned no accounts");
            self.lock().status = format!("Connection Failed: {}", err);
            return Err(err);
        };
        self.attach(&handle, account.clone())?;
        Ok(account)
    }

    fn attach(&self, handle: &WalletHandle, account: AccountId) -> AtmResult<()> {
        let bound = self.contract.bind(
            Some(handle),
            Some(&account),
            self.config.contract_address,
            self.config.abi.clone(),
        );
        let mut s = self.lock();
        let contract = match bound {
            Ok(c) => c,
            Err(e) => {
                s.status = format!("Connection Failed: {}", e);
                return Err(e);
            }
        };
        tracing::info!(account = %account, contract = %self.config.contract_address, "account connected");
        s.account = Some(account);
        s.contract = Some(contract);
        s.state = AccountState::Open;
        s.status.clear();
        s.balance.invalidate();
        Ok(())
    }

    // =========================================================================
    // Mutating operations
    // =========================================================================

    pub async fn deposit(&self, amount: impl Into<String>) -> AtmResult<Confirmed> {
        self.set_deposit_amount(amount);
        self.execute(Operation::Deposit).await
    }

    pub async fn withdraw(&self, amount: impl Into<String>) -> AtmResult<Confirmed> {
        self.set_withdraw_amount(amount);
        self.execute(Operation::Withdraw).await
    }

    pub async fn close_account(&self) -> AtmResult<Confirmed> {
        self.execute(Operation::CloseAccount).await
    }

    pub async fn reopen_account(&self) -> AtmResult<Confirmed> {
        self.execute(Operation::ReopenAccount).await
    }

    /// Submit and wait for confirmation.
    pub async fn execute(&self, op: Operation) -> AtmResult<Confirmed> {
        let submission = self.submit(op).await?;
        self.confirm(submission).await
    }

    /// Validate, submit, and apply the optimistic update. Deposit and withdraw
    /// use the current amount input.
    pub async fn submit(&self, op: Operation) -> AtmResult<Submission> {
        let (contract, call) = {
            let mut s = self.lock();
            let contract = s.require_connection()?;
            if s.in_flight.is_some() {
                return Err(s.fail(op, AtmError::InvalidTransition(BUSY.into())));
            }
            if s.state != op.allowed_from() {
                let reason = match op {
                    Operation::ReopenAccount => REOPEN_REQUIRES_CLOSED,
                    _ => CLOSED_NOTICE,
                };
                return Err(s.fail(op, AtmError::InvalidTransition(reason.into())));
            }
            let call = if op.takes_amount() {
                let input = s.amount_input(op).trim().to_string();
                if input.is_empty() {
                    s.status = op.empty_amount_status().unwrap_or_default().into();
                    return Err(AtmError::EmptyAmount);
                }
                let value = match parse_units(&input, self.config.decimals) {
                    Ok(v) => v,
                    Err(e) => return Err(s.fail(op, e.into())),
                };
                match op {
                    Operation::Withdraw => AtmCall::Withdraw(value),
                    _ => AtmCall::Deposit(value),
                }
            } else if op == Operation::CloseAccount {
                AtmCall::CloseAccount
            } else {
                AtmCall::ReopenAccount
            };
            s.in_flight = Some(InFlight::Submitting { operation: op });
            (contract, call)
        };

        let receipt = match self.contract.invoke(&contract, call).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(operation = op.label(), "submission failed: {}", e);
                let mut s = self.lock();
                s.in_flight = None;
                return Err(s.fail(op, e));
            }
        };

        {
            let mut s = self.lock();
            s.status = op.submitted_status().into();
            s.balance.invalidate();
            s.state = op.target();
            s.in_flight = Some(InFlight::AwaitingConfirmation { operation: op, tx_hash: receipt.tx_hash.clone() });
        }
        tracing::info!(operation = op.label(), tx = %receipt.tx_hash, "submitted, awaiting confirmation");
        Ok(Submission { operation: op, receipt })
    }

    /// Wait for finality. Failure rewrites the status line only; the lifecycle
    /// transition recorded at submission stands.
    pub async fn confirm(&self, submission: Submission) -> AtmResult<Confirmed> {
        let op = submission.operation;
        let result = self.contract.await_confirmation(&submission.receipt).await;
        let mut s = self.lock();
        s.in_flight = None;
        match result {
            Ok(confirmed) => {
                if op.takes_amount() {
                    s.amount_input(op).clear();
                }
                Ok(confirmed)
            }
            Err(e) => {
                tracing::warn!(operation = op.label(), tx = %submission.receipt.tx_hash,
                    state = ?s.state, "confirmation failed, lifecycle not rolled back: {}", e);
                Err(s.fail(op, e))
            }
        }
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Read the balance unless one is already cached.
    pub async fn fetch_balance(&self) -> AtmResult<BalanceSnapshot> {
        let (contract, epoch) = {
            let mut s = self.lock();
            let contract = s.require_connection()?;
            if let BalanceSnapshot::Known(v) = s.balance.get() {
                s.status = balance_status(v);
                return Ok(BalanceSnapshot::Known(v));
            }
            (contract, s.balance.epoch())
        };

        let raw = match self.contract.read(&contract, AtmQuery::FetchBalance).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("balance fetch failed: {}", e);
                self.lock().status = format!("Error fetching balance: {}", e);
                return Err(e);
            }
        };

        let shown = format_units(raw, self.config.decimals).unwrap_or_else(|_| raw.to_string());
        let mut s = self.lock();
        match s.balance.populate_for(epoch, raw) {
            Ok(true) => tracing::debug!(balance = %shown, "balance cached"),
            Ok(false) => tracing::debug!(balance = %shown, "balance already cached or invalidated meanwhile"),
            Err(e) => {
                s.status = format!("Error fetching balance: {}", e);
                return Err(e.into());
            }
        }
        let snapshot = s.balance.get();
        if let BalanceSnapshot::Known(v) = snapshot {
            s.status = balance_status(v);
        }
        Ok(snapshot)
    }
}

fn balance_status(value: EthAmount) -> String {
    format!("Your account balance is {} ETH.", value)
}
