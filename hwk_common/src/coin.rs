use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Model};

/// Bit marking a hardened derivation index.
pub const HARDENED: u32 = 0x8000_0000;

/// Placeholder replaced by the network name in method labels.
pub const NETWORK_PLACEHOLDER: &str = "#NETWORK";

/// Minimum firmware known to support a coin, per device model.
///
/// Registry entries are keyed `trezor1`, `trezor2`, ...; the bare model id is accepted too.
/// A `null` entry means no firmware of that model is known to support the coin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinSupport(BTreeMap<String, Option<String>>);

impl CoinSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, version: Option<&str>) -> Self {
        self.0.insert(key.to_string(), version.map(ToString::to_string));
        self
    }

    /// The minimum firmware version supporting the coin on `model`, if any
    pub fn min_firmware(&self, model: Model) -> Option<&str> {
        self.0
            .get(&format!("trezor{model}"))
            .or_else(|| self.0.get(&model.to_string()))
            .and_then(|v| v.as_deref())
    }
}

/// Coin (or network) metadata as found in the coin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinInfo {
    /// Coin family, eg. `bitcoin`, `ethereum`, `ripple`
    #[serde(rename = "type")]
    pub coin_type: String,

    #[serde(default)]
    pub name: String,

    /// Ticker, eg. `btc`, `eth`
    pub shortcut: String,

    /// SLIP-44 coin type used in derivation paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip44: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<CoinSupport>,
}

impl CoinInfo {
    /// The minimum firmware version supporting this coin on `model`.
    ///
    /// `None` both when the registry has no support data at all and when the model entry is
    /// missing or `null`.
    pub fn min_firmware(&self, model: Model) -> Option<&str> {
        self.support.as_ref()?.min_firmware(model)
    }

    pub fn is_testnet(&self) -> bool {
        self.name.to_lowercase().contains("testnet")
    }
}

/// In-memory view of the coin registry.
///
/// Loading the registry is up to the caller, see [`CoinRegistry::from_json_str`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinRegistry {
    coins: Vec<CoinInfo>,
}

impl CoinRegistry {
    pub fn new(coins: Vec<CoinInfo>) -> Self {
        Self { coins }
    }

    /// Parse a JSON array of [`CoinInfo`]
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn coins(&self) -> &[CoinInfo] {
        &self.coins
    }

    pub fn by_shortcut(&self, shortcut: &str) -> Option<&CoinInfo> {
        self.coins
            .iter()
            .find(|c| c.shortcut.eq_ignore_ascii_case(shortcut))
    }

    /// The ethereum network whose SLIP-44 coin type is the second component of `path`.
    pub fn ethereum_network(&self, path: &[u32]) -> Option<&CoinInfo> {
        let slip44 = path.get(1)? & !HARDENED;
        let network = self
            .coins
            .iter()
            .find(|c| c.coin_type == "ethereum" && c.slip44 == Some(slip44));
        log::debug!("ethereum network for slip44 {slip44}: {network:?}");
        network
    }
}

/// Replace the network placeholder in `label` with the network name.
///
/// Test networks are all shown as `Testnet`. Without a network the placeholder is dropped.
pub fn network_label(label: &str, network: Option<&CoinInfo>) -> String {
    let name = match network {
        Some(n) if n.is_testnet() => "Testnet",
        Some(n) => n.name.as_str(),
        None => "",
    };
    label
        .replace(NETWORK_PLACEHOLDER, name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn eth() -> CoinInfo {
        serde_json::from_value(serde_json::json!({
            "type": "ethereum",
            "name": "Ethereum",
            "shortcut": "ETH",
            "slip44": 60,
            "chainId": 1,
            "support": { "trezor1": "1.6.2", "trezor2": "2.0.7" }
        }))
        .unwrap()
    }

    #[test]
    fn test_min_firmware() {
        let coin = eth();
        assert_eq!(coin.min_firmware(Model::ONE), Some("1.6.2"));
        assert_eq!(coin.min_firmware(Model::TWO), Some("2.0.7"));
        assert_eq!(coin.min_firmware(Model::new(3).unwrap()), None);

        let support = CoinSupport::new()
            .with("trezor1", None)
            .with("2", Some("2.1.0"));
        assert_eq!(support.min_firmware(Model::ONE), None);
        assert_eq!(support.min_firmware(Model::TWO), Some("2.1.0"));

        let coin = CoinInfo {
            support: None,
            ..eth()
        };
        assert_eq!(coin.min_firmware(Model::ONE), None);
    }

    #[test]
    fn test_ethereum_network() {
        let classic = CoinInfo {
            name: "Ethereum Classic".into(),
            shortcut: "ETC".into(),
            slip44: Some(61),
            chain_id: Some(61),
            ..eth()
        };
        let registry = CoinRegistry::new(vec![eth(), classic]);

        let path = [44 | HARDENED, 60 | HARDENED, HARDENED, 0, 0];
        assert_eq!(registry.ethereum_network(&path).unwrap().shortcut, "ETH");
        let path = [44 | HARDENED, 61 | HARDENED, HARDENED];
        assert_eq!(registry.ethereum_network(&path).unwrap().shortcut, "ETC");
        let path = [44 | HARDENED, HARDENED, HARDENED];
        assert!(registry.ethereum_network(&path).is_none());
        assert!(registry.ethereum_network(&[44 | HARDENED]).is_none());

        assert_eq!(registry.by_shortcut("etc").unwrap().slip44, Some(61));
    }

    #[test]
    fn test_network_label() {
        let label = "Sign #NETWORK transaction";
        assert_eq!(network_label(label, Some(&eth())), "Sign Ethereum transaction");
        let ropsten = CoinInfo {
            name: "Ethereum Testnet Ropsten".into(),
            ..eth()
        };
        assert_eq!(network_label(label, Some(&ropsten)), "Sign Testnet transaction");
        assert_eq!(network_label(label, None), "Sign transaction");
    }
}
