//! Pure projection of session state into what the front-end shows.

use crate::session::{AccountState, InFlight, SessionSnapshot, CLOSED_NOTICE, CONNECT_REQUIRED, WALLET_REQUIRED};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ViewModel {
    /// No wallet capability: nothing else is reachable.
    WalletRequired { message: String },
    ConnectPrompt { message: String },
    Closed {
        account: String,
        notice: String,
        status: Option<String>,
    },
    Open {
        account: String,
        owner: Option<String>,
        deposit_amount: String,
        withdraw_amount: String,
        status: Option<String>,
        balance_line: Option<String>,
        pending_line: Option<String>,
    },
}

/// Render a snapshot. `owner` is the optional display name from config.
pub fn render(snapshot: &SessionSnapshot, owner: Option<&str>) -> ViewModel {
    if !snapshot.wallet_detected {
        return ViewModel::WalletRequired { message: WALLET_REQUIRED.into() };
    }
    let account = match (&snapshot.account, snapshot.state) {
        (Some(a), s) if s.is_connected() => a.to_string(),
        _ => return ViewModel::ConnectPrompt { message: CONNECT_REQUIRED.into() },
    };
    let status = Some(snapshot.status.clone()).filter(|s| !s.is_empty());

    if snapshot.state == AccountState::Closed {
        return ViewModel::Closed { account, notice: CLOSED_NOTICE.into(), status };
    }

    ViewModel::Open {
        account,
        owner: owner.map(str::to_string),
        deposit_amount: snapshot.deposit_amount.clone(),
        withdraw_amount: snapshot.withdraw_amount.clone(),
        status,
        balance_line: snapshot.balance.value().map(|v| format!("Your account balance is {} ETH.", v)),
        pending_line: snapshot.in_flight.as_ref().map(|f| {
            let label = f.operation().label();
            match f {
                InFlight::Submitting { .. } => format!("{}: waiting for wallet approval", label),
                InFlight::AwaitingConfirmation { tx_hash, .. } => format!("{}: awaiting confirmation of {}", label, tx_hash),
            }
        }),
    }
}
