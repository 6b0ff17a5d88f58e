//! HttpProvider - JSON-RPC 2.0 over HTTP (hardhat / anvil / geth endpoints)

use super::{Eip1193, RpcError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into(), next_id: AtomicU64::new(1) }
    }

    pub fn url(&self) -> &str { &self.url }
}

#[async_trait]
impl Eip1193 for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        tracing::debug!(method, id, "rpc request");

        let resp = self.client.post(&self.url).json(&body).send().await
            .map_err(|e| RpcError::internal(format!("transport: {}", e)))?;
        let envelope: Envelope = resp.json().await
            .map_err(|e| RpcError::internal(format!("response: {}", e)))?;

        match (envelope.error, envelope.result) {
            (Some(err), _) => {
                tracing::debug!(method, id, code = err.code, "rpc error: {}", err.message);
                Err(err)
            }
            (None, result) => Ok(result.unwrap_or(Value::Null)),
        }
    }
}
