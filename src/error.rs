//! Error taxonomy for the ATM session.
//!
//! Every variant's `Display` is the text shown after the operation label in the
//! status line (`"Deposit Failed: {error}"`), so remote messages are carried
//! verbatim.

use crate::rpc::RpcError;
use crate::units::UnitsError;
use thiserror::Error;

pub type AtmResult<T> = Result<T, AtmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtmError {
    /// No injected wallet capability. Not recoverable in-process.
    #[error("A wallet is required to use this ATM")]
    NoWallet,

    /// The user declined a connect or signing prompt.
    #[error("{0}")]
    UserRejected(String),

    /// Contract handle could not be constructed (missing account, bad ABI).
    #[error("{0}")]
    Binding(String),

    /// Remote call rejected at submission.
    #[error("{0}")]
    Submission(String),

    /// Submitted but never finalized, or finalized as reverted.
    #[error("{0}")]
    Confirmation(String),

    /// Rejected by the session before any remote call.
    #[error("{0}")]
    InvalidTransition(String),

    /// Read-only call failed.
    #[error("{0}")]
    Read(String),

    #[error("empty amount")]
    EmptyAmount,

    #[error(transparent)]
    Units(#[from] UnitsError),

    #[error("config: {0}")]
    Config(String),
}

impl AtmError {
    /// Map a wallet RPC failure, keeping user rejections distinct.
    pub fn from_wallet_rpc(err: RpcError) -> Self {
        if err.is_user_rejection() {
            AtmError::UserRejected(err.message)
        } else {
            AtmError::Binding(err.message)
        }
    }

    pub fn from_submission_rpc(err: RpcError) -> Self {
        if err.is_user_rejection() {
            AtmError::UserRejected(err.message)
        } else {
            AtmError::Submission(err.message)
        }
    }
}
