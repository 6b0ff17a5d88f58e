//! Session configuration - passed from the front-end

use crate::contract::ContractAbi;
use crate::error::{AtmError, AtmResult};
use crate::units::{ETH_DECIMALS, MAX_DECIMALS};
use alloy_primitives::Address;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// First contract deployed by a fresh hardhat node.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone)]
pub struct AtmConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    pub abi: Arc<ContractAbi>,
    pub decimals: u8,
    /// Shown on the open-account panel when set.
    pub owner: Option<String>,
    pub poll_interval: Duration,
    pub confirm_timeout: Duration,
}

impl Default for AtmConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.into(),
            contract_address: Address::from_str(DEFAULT_CONTRACT_ADDRESS).unwrap_or(Address::ZERO),
            abi: Arc::new(ContractAbi::assessment()),
            decimals: ETH_DECIMALS,
            owner: None,
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Duration::from_secs(120),
        }
    }
}

impl AtmConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self { self.rpc_url = url.into(); self }
    pub fn with_contract_address(mut self, address: Address) -> Self { self.contract_address = address; self }
    pub fn with_abi(mut self, abi: ContractAbi) -> Self { self.abi = Arc::new(abi); self }
    pub fn with_decimals(mut self, decimals: u8) -> Self { self.decimals = decimals; self }
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self { self.owner = Some(owner.into()); self }
    pub fn with_confirmation(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.confirm_timeout = timeout;
        self
    }

    pub fn parse_address(value: &str) -> AtmResult<Address> {
        Address::from_str(value.trim())
            .map_err(|e| AtmError::Config(format!("contract address {:?}: {}", value, e)))
    }

    /// Load the ABI from a hardhat artifact on disk.
    pub fn with_abi_file(self, path: &Path) -> AtmResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AtmError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(self.with_abi(ContractAbi::from_artifact(&raw)?))
    }

    pub fn validate(&self) -> AtmResult<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(AtmError::Config(format!("decimals {} exceeds {}", self.decimals, MAX_DECIMALS)));
        }
        if self.contract_address == Address::ZERO {
            return Err(AtmError::Config("contract address is unset".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(AtmError::Config("poll interval must be positive".into()));
        }
        self.abi.validate()
    }
}
