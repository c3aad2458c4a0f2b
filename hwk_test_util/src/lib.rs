use hwk_common::{CoinRegistry, Config};

/// Ethereum networks (`ETH`, a testnet, `ETC`) plus `BTC`
pub const ETHEREUM_NETWORKS: &str = include_str!("../test_data/ethereum_networks.json");

/// Rules raising the minimum firmware of ethereum signing, with a stricter rule for `ETC`
pub const SUPPORTED_FIRMWARE_CONFIG: &str = include_str!("../test_data/config.json");

pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn coin_registry() -> CoinRegistry {
    CoinRegistry::from_json_str(ETHEREUM_NETWORKS).unwrap()
}

pub fn supported_firmware_config() -> Config {
    Config::from_json_str(SUPPORTED_FIRMWARE_CONFIG).unwrap()
}

/// A legacy transaction sending 1000000 wei on mainnet
pub fn legacy_tx() -> serde_json::Value {
    serde_json::json!({
        "to": "0xd0d6d6c5fe4a677d343cc433536bb717bae167dd",
        "value": "0xf4240",
        "gasLimit": "0x5208",
        "gasPrice": "0xbebc200",
        "nonce": "0x0",
        "chainId": 1,
    })
}

/// The same transfer as [`legacy_tx`] with fee market fields in place of the gas price
pub fn eip1559_tx() -> serde_json::Value {
    serde_json::json!({
        "to": "0xd0d6d6c5fe4a677d343cc433536bb717bae167dd",
        "value": "0xf4240",
        "gasLimit": "0x5208",
        "maxFeePerGas": "0xbebc200",
        "maxPriorityFeePerGas": "0xbebc200",
        "nonce": "0x0",
        "chainId": 1,
        "accessList": [],
    })
}
