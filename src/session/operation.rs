//! Lifecycle states, mutating operations and their status lines.

use serde::Serialize;

pub const WALLET_REQUIRED: &str = "Please install a wallet to use this ATM.";
pub const CONNECT_REQUIRED: &str = "Please connect your wallet to use this ATM.";
pub const CLOSED_NOTICE: &str = "Account closed: Reopen account to operate";
pub const REOPEN_REQUIRES_CLOSED: &str = "Close account to reopen";
pub const BUSY: &str = "Another transaction is awaiting confirmation";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    #[default]
    Unconnected,
    Open,
    Closed,
}

impl AccountState {
    pub fn is_connected(&self) -> bool { !matches!(self, AccountState::Unconnected) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Deposit,
    Withdraw,
    CloseAccount,
    ReopenAccount,
}

impl Operation {
    /// Prefix of the failure status (`"{label} Failed: ..."`).
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Deposit => "Deposit",
            Operation::Withdraw => "Withdrawal",
            Operation::CloseAccount => "Close Account",
            Operation::ReopenAccount => "Reopen Account",
        }
    }

    pub fn submitted_status(&self) -> &'static str {
        match self {
            Operation::Deposit => "Deposit Successful",
            Operation::Withdraw => "Withdrawal Successful",
            Operation::CloseAccount => "Account Closed",
            Operation::ReopenAccount => "Account Reopened",
        }
    }

    pub fn failed_status(&self, reason: impl std::fmt::Display) -> String {
        format!("{} Failed: {}", self.label(), reason)
    }

    pub fn empty_amount_status(&self) -> Option<&'static str> {
        match self {
            Operation::Deposit => Some("Please enter a valid deposit amount"),
            Operation::Withdraw => Some("Please enter a valid withdrawal amount"),
            _ => None,
        }
    }

    pub fn takes_amount(&self) -> bool {
        matches!(self, Operation::Deposit | Operation::Withdraw)
    }

    /// Lifecycle state the operation may start from.
    pub fn allowed_from(&self) -> AccountState {
        match self {
            Operation::ReopenAccount => AccountState::Closed,
            _ => AccountState::Open,
        }
    }

    /// Lifecycle state recorded once the operation is submitted.
    pub fn target(&self) -> AccountState {
        match self {
            Operation::CloseAccount => AccountState::Closed,
            _ => AccountState::Open,
        }
    }
}

/// The one mutating operation allowed in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InFlight {
    Submitting { operation: Operation },
    AwaitingConfirmation { operation: Operation, tx_hash: String },
}

impl InFlight {
    pub fn operation(&self) -> Operation {
        match self {
            InFlight::Submitting { operation } | InFlight::AwaitingConfirmation { operation, .. } => *operation,
        }
    }
}
