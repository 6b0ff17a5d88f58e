//! Provider transport - EIP-1193 `request(method, params)`
//!
//! Both the wallet gateway and the contract binding speak to the ledger through
//! this one seam. In a browser it is the injected provider; natively it is a
//! JSON-RPC endpoint ([`HttpProvider`]).
//!
//! | Code | Meaning |
//! |------|---------|
//! | `4001` | User rejected the request |
//! | `-32601` | Method not supported |
//! | `-32603` | Internal / transport failure |

#[cfg(feature = "native")]
mod http;

#[cfg(feature = "native")]
pub use http::HttpProvider;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const USER_REJECTED: i64 = 4001;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("{message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_unsupported(&self) -> bool {
        self.code == METHOD_NOT_FOUND
    }
}

#[async_trait]
pub trait Eip1193: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}
