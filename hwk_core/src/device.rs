use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;

use async_trait::async_trait;

use crate::protocol::{Eip1559Tx, EthereumTxSignature, LegacyTx};

/// A protocol feature the connected firmware may lack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Fee market (type 2) ethereum transactions
    Eip1559,
    Eip712,
    Other(String),
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Eip1559 => write!(f, "eip1559"),
            Capability::Eip712 => write!(f, "eip712"),
            Capability::Other(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Capability {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eip1559" => Capability::Eip1559,
            "eip712" => Capability::Eip712,
            _ => Capability::Other(s.to_string()),
        })
    }
}

/// The active session with a device, as seen by a method while it runs.
///
/// Implementors own framing, the multi-round exchange with the device and the serialization
/// of calls: a session is borrowed mutably by one running method at a time.
#[async_trait]
pub trait DeviceSession: Send {
    type Error: std::fmt::Debug + Send;

    /// Capabilities the connected firmware does not support
    fn unavailable_capabilities(&self) -> &HashSet<Capability>;

    fn is_available(&self, capability: &Capability) -> bool {
        !self.unavailable_capabilities().contains(capability)
    }

    /// Sign a legacy ethereum transaction with the key at `path`
    async fn ethereum_sign_tx(
        &mut self,
        path: &[u32],
        tx: LegacyTx,
    ) -> Result<EthereumTxSignature, Self::Error>;

    /// Sign a fee market ethereum transaction with the key at `path`
    async fn ethereum_sign_tx_eip1559(
        &mut self,
        path: &[u32],
        tx: Eip1559Tx,
    ) -> Result<EthereumTxSignature, Self::Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_capability_roundtrip() {
        for name in ["eip1559", "eip712", "capability_coinjoin"] {
            let c: Capability = name.parse().unwrap();
            assert_eq!(c.to_string(), name);
        }
        assert_eq!("eip1559".parse::<Capability>().unwrap(), Capability::Eip1559);
    }
}
