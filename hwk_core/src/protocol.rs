//! Data exchanged with the device session builders.
//!
//! All the string fields are hex without the `0x` prefix and with an even number of digits.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTx {
    pub to: String,
    pub value: String,
    pub gas_limit: String,

    /// Missing when a fee market transaction falls back to the legacy format
    pub gas_price: Option<String>,
    pub nonce: String,
    pub data: Option<String>,
    pub chain_id: Option<u64>,
    pub tx_type: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559Tx {
    pub to: String,
    pub value: String,
    pub gas_limit: String,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    pub nonce: String,
    pub chain_id: u64,
    pub data: Option<String>,
    pub access_list: Vec<AccessListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessListItem {
    pub address: String,
    pub storage_keys: Vec<String>,
}

/// Signature components as returned by the device
#[derive(Clone, PartialEq, Eq)]
pub struct EthereumTxSignature {
    pub v: u32,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

impl Debug for EthereumTxSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumTxSignature")
            .field("v", &self.v)
            .field("r", &hex::encode(&self.r))
            .field("s", &hex::encode(&self.s))
            .finish()
    }
}

/// The signature returned to the host, `0x` prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumSignedTx {
    pub v: String,
    pub r: String,
    pub s: String,
}

impl From<EthereumTxSignature> for EthereumSignedTx {
    fn from(sig: EthereumTxSignature) -> Self {
        EthereumSignedTx {
            v: format!("0x{:x}", sig.v),
            r: format!("0x{}", hex::encode(sig.r)),
            s: format!("0x{}", hex::encode(sig.s)),
        }
    }
}
