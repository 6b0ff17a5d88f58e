//! ABI descriptor - function selectors and uint256 word codec
//!
//! Only what the ATM contract needs: static `uint256` arguments and a single
//! `uint256` return word. Descriptors come from canonical signatures or from a
//! hardhat artifact (`artifacts/contracts/<Name>.sol/<Name>.json`).

use crate::error::{AtmError, AtmResult};
use alloy_primitives::{keccak256, U256};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const FETCH_BALANCE: &str = "fetchBalance";
pub const DEPOSIT: &str = "deposit";
pub const WITHDRAW: &str = "withdraw";
pub const CLOSE_ACCOUNT: &str = "closeAccount";
pub const REOPEN_ACCOUNT: &str = "reopenAccount";

/// Functions every ATM ABI must expose, with their input types.
pub const REQUIRED: &[(&str, &[&str])] = &[
    (FETCH_BALANCE, &[]),
    (DEPOSIT, &["uint256"]),
    (WITHDRAW, &["uint256"]),
    (CLOSE_ACCOUNT, &[]),
    (REOPEN_ACCOUNT, &[]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<String>,
    pub signature: String,
    pub selector: [u8; 4],
}

impl Function {
    pub fn new(name: &str, inputs: &[&str]) -> Self {
        let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
        let signature = format!("{}({})", name, inputs.join(","));
        let hash = keccak256(signature.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        Self { name: name.to_string(), inputs, signature, selector }
    }
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    functions: BTreeMap<String, Function>,
}

impl ContractAbi {
    /// The built-in ATM ABI.
    pub fn assessment() -> Self {
        let mut abi = Self::default();
        for (name, inputs) in REQUIRED {
            abi.insert(Function::new(name, inputs));
        }
        abi
    }

    /// Load from a hardhat artifact (`{"abi": [...]}`) or a bare ABI array.
    pub fn from_artifact(json: &str) -> AtmResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| AtmError::Binding(format!("ABI json: {}", e)))?;
        let items = match value {
            Value::Array(_) => value,
            Value::Object(mut obj) => obj.remove("abi")
                .ok_or_else(|| AtmError::Binding("artifact has no 'abi'".into()))?,
            _ => return Err(AtmError::Binding("ABI must be an array or artifact object".into())),
        };
        let items: Vec<AbiItem> = serde_json::from_value(items)
            .map_err(|e| AtmError::Binding(format!("ABI entries: {}", e)))?;

        let mut abi = Self::default();
        for item in items {
            if item.kind.as_deref().unwrap_or("function") != "function" { continue; }
            let Some(name) = item.name else { continue };
            let inputs: Vec<&str> = item.inputs.iter().map(|p| p.kind.as_str()).collect();
            abi.insert(Function::new(&name, &inputs));
        }
        abi.validate()?;
        Ok(abi)
    }

    fn insert(&mut self, f: Function) { self.functions.insert(f.name.clone(), f); }

    /// Every ATM function present with the expected inputs.
    pub fn validate(&self) -> AtmResult<()> {
        for (name, inputs) in REQUIRED {
            let expected = Function::new(name, inputs);
            match self.functions.get(*name) {
                Some(f) if f.signature == expected.signature => {}
                Some(f) => return Err(AtmError::Binding(format!(
                    "ABI declares {} but {} is required", f.signature, expected.signature
                ))),
                None => return Err(AtmError::Binding(format!("ABI is missing {}", expected.signature))),
            }
        }
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&Function> { self.functions.get(name) }

    /// Selector followed by one 32-byte big-endian word per argument.
    pub fn encode(&self, name: &str, args: &[U256]) -> AtmResult<Vec<u8>> {
        let f = self.function(name)
            .ok_or_else(|| AtmError::Binding(format!("ABI has no function {}", name)))?;
        if f.inputs.len() != args.len() {
            return Err(AtmError::Binding(format!(
                "{} takes {} argument(s), got {}", f.signature, f.inputs.len(), args.len()
            )));
        }
        let mut data = Vec::with_capacity(4 + 32 * args.len());
        data.extend_from_slice(&f.selector);
        for arg in args {
            data.extend_from_slice(&arg.to_be_bytes::<32>());
        }
        Ok(data)
    }
}

/// `0x`-prefixed hex for JSON-RPC payloads.
pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode the first return word of an `eth_call` result.
pub fn decode_uint(result: &str) -> Result<U256, String> {
    let raw = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(raw).map_err(|e| format!("malformed return data: {}", e))?;
    if bytes.len() < 32 {
        return Err(format!("expected a uint256 return word, got {} bytes", bytes.len()));
    }
    Ok(U256::from_be_slice(&bytes[..32]))
}
