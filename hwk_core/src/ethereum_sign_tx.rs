//! Sign an ethereum transaction, either legacy or fee market (EIP-1559).
//!
//! The variant is not tagged in the payload: a transaction is a fee market one when it carries
//! both `maxFeePerGas` and `maxPriorityFeePerGas`. This is the *requested* variant, decided when
//! the method is built. The *effective* variant is decided in [`Method::run`]: if the device
//! reports fee market transactions as unavailable the legacy format is used anyway.

use std::collections::HashSet;

use async_trait::async_trait;
use hwk_common::{network_label, resolve_firmware_range, FirmwareRange};

use crate::consts::{MIN_ETHEREUM_PATH_LENGTH, SIGN_TX_LABEL};
use crate::device::{Capability, DeviceSession};
use crate::method::{CoreMessage, Method, MethodContext, MethodName, Permission};
use crate::params::{validate_params, FieldSchema, FieldType, ValidationError};
use crate::path::validate_path;
use crate::payload::{Object, Value};
use crate::protocol::{AccessListItem, Eip1559Tx, EthereumSignedTx, LegacyTx};
use crate::{Error, Result};

const PARAMS_SCHEMA: &[FieldSchema] = &[
    FieldSchema::new("path").obligatory(),
    FieldSchema::new("transaction")
        .typed(FieldType::Object)
        .obligatory(),
];

const LEGACY_SCHEMA: &[FieldSchema] = &[
    FieldSchema::new("to").typed(FieldType::String).obligatory(),
    FieldSchema::new("value").typed(FieldType::String).obligatory(),
    FieldSchema::new("gasLimit")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("gasPrice")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("nonce").typed(FieldType::String).obligatory(),
    FieldSchema::new("data").typed(FieldType::String),
    FieldSchema::new("chainId").typed(FieldType::Number),
    FieldSchema::new("txType").typed(FieldType::Number),
];

const EIP1559_SCHEMA: &[FieldSchema] = &[
    FieldSchema::new("to").typed(FieldType::String).obligatory(),
    FieldSchema::new("value").typed(FieldType::String).obligatory(),
    FieldSchema::new("gasLimit")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("maxFeePerGas")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("maxPriorityFeePerGas")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("nonce").typed(FieldType::String).obligatory(),
    FieldSchema::new("data").typed(FieldType::String),
    FieldSchema::new("chainId")
        .typed(FieldType::Number)
        .obligatory(),
    FieldSchema::new("accessList")
        .typed(FieldType::Array)
        .allow_empty(),
];

const ACCESS_LIST_ITEM_SCHEMA: &[FieldSchema] = &[
    FieldSchema::new("address")
        .typed(FieldType::String)
        .obligatory(),
    FieldSchema::new("storageKeys")
        .typed(FieldType::Array)
        .obligatory()
        .allow_empty(),
];

/// Strip the `0x` prefix of a hex string and left pad it with a `0` to an even length.
pub fn normalize_hex(s: &str) -> String {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if stripped.len() % 2 != 0 {
        format!("0{stripped}")
    } else {
        stripped.to_string()
    }
}

/// Apply [`normalize_hex`] to every string in the tree, other values are kept as they are.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_hex(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(o) => Value::Object(normalize_object(o)),
        other => other,
    }
}

fn normalize_object(o: Object) -> Object {
    o.into_iter().map(|(k, v)| (k, normalize(v))).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVariant {
    Legacy,
    FeeMarket,
}

impl TxVariant {
    /// The variant of the transaction, decided by the presence of both fee ceilings
    pub fn of(tx: &Object) -> Self {
        if tx.contains_key("maxFeePerGas") && tx.contains_key("maxPriorityFeePerGas") {
            TxVariant::FeeMarket
        } else {
            TxVariant::Legacy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeeMarket {
    max_fee_per_gas: String,
    max_priority_fee_per_gas: String,
    chain_id: u64,
    access_list: Vec<AccessListItem>,
}

/// A validated and normalized ethereum transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthereumTransaction {
    to: String,
    value: String,
    gas_limit: String,
    gas_price: Option<String>,
    nonce: String,
    data: Option<String>,
    chain_id: Option<u64>,
    tx_type: Option<u64>,
    fee_market: Option<FeeMarket>,
}

/// The request handed to one of the device builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignTxRequest {
    Legacy(LegacyTx),
    Eip1559(Eip1559Tx),
}

fn string(tx: &Object, field: &str) -> Option<String> {
    tx.get(field).and_then(Value::as_str).map(ToString::to_string)
}

fn required_string(tx: &Object, field: &str) -> Result<String> {
    string(tx, field).ok_or_else(|| {
        ValidationError::MissingField {
            field: field.to_string(),
        }
        .into()
    })
}

fn integer(tx: &Object, field: &str) -> Result<Option<u64>> {
    match tx.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| Error::InvalidInteger(field.to_string())),
    }
}

fn access_list(tx: &Object) -> Result<Vec<AccessListItem>> {
    let Some(items) = tx.get("accessList").and_then(Value::as_array) else {
        return Ok(vec![]);
    };
    items
        .iter()
        .map(|item| -> Result<AccessListItem> {
            let item = item.as_object().ok_or(ValidationError::WrongType {
                field: "accessList".to_string(),
                expected: FieldType::Object,
                found: item.kind(),
            })?;
            validate_params(item, ACCESS_LIST_ITEM_SCHEMA)?;
            let storage_keys = item
                .get("storageKeys")
                .and_then(Value::as_array)
                .unwrap_or_default()
                .iter()
                .map(|k| {
                    k.as_str()
                        .map(ToString::to_string)
                        .ok_or(ValidationError::WrongType {
                            field: "storageKeys".to_string(),
                            expected: FieldType::String,
                            found: k.kind(),
                        })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(AccessListItem {
                address: required_string(item, "address")?,
                storage_keys,
            })
        })
        .collect()
}

impl EthereumTransaction {
    /// Normalize the hex fields of `tx` and validate it against the schema of its variant
    pub fn from_payload(tx: &Object) -> Result<Self> {
        let variant = TxVariant::of(tx);
        let tx = normalize_object(tx.clone());

        let schema = match variant {
            TxVariant::Legacy => LEGACY_SCHEMA,
            TxVariant::FeeMarket => EIP1559_SCHEMA,
        };
        validate_params(&tx, schema)?;

        let chain_id = integer(&tx, "chainId")?;
        let fee_market = match (variant, chain_id) {
            (TxVariant::Legacy, _) => None,
            (TxVariant::FeeMarket, Some(chain_id)) => Some(FeeMarket {
                max_fee_per_gas: required_string(&tx, "maxFeePerGas")?,
                max_priority_fee_per_gas: required_string(&tx, "maxPriorityFeePerGas")?,
                chain_id,
                access_list: access_list(&tx)?,
            }),
            (TxVariant::FeeMarket, None) => {
                return Err(ValidationError::MissingField {
                    field: "chainId".to_string(),
                }
                .into())
            }
        };

        Ok(EthereumTransaction {
            to: required_string(&tx, "to")?,
            value: required_string(&tx, "value")?,
            gas_limit: required_string(&tx, "gasLimit")?,
            gas_price: string(&tx, "gasPrice"),
            nonce: required_string(&tx, "nonce")?,
            data: string(&tx, "data"),
            chain_id,
            tx_type: integer(&tx, "txType")?,
            fee_market,
        })
    }

    /// The variant asked by the caller
    pub fn requested_variant(&self) -> TxVariant {
        match self.fee_market {
            Some(_) => TxVariant::FeeMarket,
            None => TxVariant::Legacy,
        }
    }

    /// The variant to use with a device lacking the `unavailable` capabilities
    pub fn effective_variant(&self, unavailable: &HashSet<Capability>) -> TxVariant {
        match self.requested_variant() {
            TxVariant::FeeMarket if !unavailable.contains(&Capability::Eip1559) => {
                TxVariant::FeeMarket
            }
            _ => TxVariant::Legacy,
        }
    }

    /// Build the request for the given variant.
    ///
    /// The legacy request ignores the fee market fields, the fee market request falls back to
    /// legacy if the transaction has no fee market fields.
    pub fn into_request(self, variant: TxVariant) -> SignTxRequest {
        match (variant, self.fee_market) {
            (TxVariant::FeeMarket, Some(fee_market)) => SignTxRequest::Eip1559(Eip1559Tx {
                to: self.to,
                value: self.value,
                gas_limit: self.gas_limit,
                max_fee_per_gas: fee_market.max_fee_per_gas,
                max_priority_fee_per_gas: fee_market.max_priority_fee_per_gas,
                nonce: self.nonce,
                chain_id: fee_market.chain_id,
                data: self.data,
                access_list: fee_market.access_list,
            }),
            _ => SignTxRequest::Legacy(LegacyTx {
                to: self.to,
                value: self.value,
                gas_limit: self.gas_limit,
                gas_price: self.gas_price,
                nonce: self.nonce,
                data: self.data,
                chain_id: self.chain_id,
                tx_type: self.tx_type,
            }),
        }
    }
}

/// The `ethereumSignTransaction` method
#[derive(Debug)]
pub struct EthereumSignTransaction {
    required_permissions: Vec<Permission>,
    firmware_range: FirmwareRange,
    info: String,
    path: Vec<u32>,
    transaction: EthereumTransaction,
}

impl EthereumSignTransaction {
    pub fn new(message: &CoreMessage, ctx: &MethodContext<'_>) -> Result<Self> {
        let name = MethodName::EthereumSignTransaction;
        let required_permissions = vec![Permission::Read, Permission::Write];

        let payload = &message.payload;
        validate_params(payload, PARAMS_SCHEMA)?;

        let path = validate_path(
            payload.get("path").unwrap_or(&Value::Null),
            MIN_ETHEREUM_PATH_LENGTH,
        )?;
        let network = ctx.coins.ethereum_network(&path);
        let firmware_range = resolve_firmware_range(
            &name.to_string(),
            network,
            &FirmwareRange::default(),
            Some(&ctx.config.supported_firmware),
        );
        let info = network_label(SIGN_TX_LABEL, network);

        let tx = payload
            .get("transaction")
            .and_then(Value::as_object)
            .ok_or_else(|| ValidationError::MissingField {
                field: "transaction".to_string(),
            })?;
        let transaction = EthereumTransaction::from_payload(tx)?;
        log::debug!(
            "{name}: requested {:?} transaction",
            transaction.requested_variant()
        );

        Ok(Self {
            required_permissions,
            firmware_range,
            info,
            path,
            transaction,
        })
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    pub fn transaction(&self) -> &EthereumTransaction {
        &self.transaction
    }
}

#[async_trait]
impl Method for EthereumSignTransaction {
    type Output = EthereumSignedTx;

    fn name(&self) -> MethodName {
        MethodName::EthereumSignTransaction
    }

    fn required_permissions(&self) -> &[Permission] {
        &self.required_permissions
    }

    fn firmware_range(&self) -> &FirmwareRange {
        &self.firmware_range
    }

    fn info(&self) -> &str {
        &self.info
    }

    async fn run<S: DeviceSession>(
        self,
        session: &mut S,
    ) -> std::result::Result<EthereumSignedTx, S::Error> {
        let requested = self.transaction.requested_variant();
        let variant = self
            .transaction
            .effective_variant(session.unavailable_capabilities());
        if variant != requested {
            log::warn!(
                "{}: {} unavailable on device, signing as {variant:?}",
                self.name(),
                Capability::Eip1559
            );
        }

        let signature = match self.transaction.into_request(variant) {
            SignTxRequest::Eip1559(tx) => session.ethereum_sign_tx_eip1559(&self.path, tx).await?,
            SignTxRequest::Legacy(tx) => session.ethereum_sign_tx(&self.path, tx).await?,
        };
        Ok(signature.into())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn object(v: serde_json::Value) -> Object {
        match Value::from(v) {
            Value::Object(o) => o,
            _ => panic!("not an object"),
        }
    }

    fn legacy() -> serde_json::Value {
        json!({
            "to": "0xd0d6d6c5fe4a677d343cc433536bb717bae167dd",
            "value": "0xf4240",
            "gasLimit": "0x5208",
            "gasPrice": "0x4a817c800",
            "nonce": "0x0",
            "data": "0xa",
            "chainId": 1,
        })
    }

    fn eip1559() -> serde_json::Value {
        json!({
            "to": "0xd0d6d6c5fe4a677d343cc433536bb717bae167dd",
            "value": "0xf4240",
            "gasLimit": "0x5208",
            "maxFeePerGas": "0x14",
            "maxPriorityFeePerGas": "0x0",
            "nonce": "0x0",
            "chainId": 1,
            "accessList": [
                { "address": "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae", "storageKeys": ["0x3", "0x07"] }
            ]
        })
    }

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("0xabc"), "0abc");
        assert_eq!(normalize_hex("0xab"), "ab");
        assert_eq!(normalize_hex("0Xab"), "ab");
        assert_eq!(normalize_hex("abc"), "0abc");
        assert_eq!(normalize_hex("0x"), "");
        assert_eq!(normalize_hex(""), "");
        for s in ["ab", "0abc", "", "00"] {
            assert_eq!(normalize_hex(s), s);
        }
        // odd length is measured in bytes
        assert_eq!(normalize_hex("0x\u{e9}"), "\u{e9}");
    }

    #[test]
    fn test_normalize_tree() {
        let value: Value = json!({
            "a": "0x1",
            "b": ["0xab", { "c": "0xabc" }],
            "d": 7,
            "e": null,
            "f": true,
        })
        .into();
        let expected: Value = json!({
            "a": "01",
            "b": ["ab", { "c": "0abc" }],
            "d": 7,
            "e": null,
            "f": true,
        })
        .into();
        assert_eq!(normalize(value), expected);
        assert_eq!(normalize(Value::Buffer(vec![1])), Value::Buffer(vec![1]));
    }

    #[test]
    fn test_legacy() {
        let tx = EthereumTransaction::from_payload(&object(legacy())).unwrap();
        assert_eq!(tx.requested_variant(), TxVariant::Legacy);
        let unavailable = HashSet::new();
        assert_eq!(tx.effective_variant(&unavailable), TxVariant::Legacy);
        let request = tx.into_request(TxVariant::FeeMarket);
        assert_eq!(
            request,
            SignTxRequest::Legacy(LegacyTx {
                to: "d0d6d6c5fe4a677d343cc433536bb717bae167dd".into(),
                value: "0f4240".into(),
                gas_limit: "5208".into(),
                gas_price: Some("04a817c800".into()),
                nonce: "00".into(),
                data: Some("0a".into()),
                chain_id: Some(1),
                tx_type: None,
            })
        );
    }

    #[test]
    fn test_eip1559() {
        let tx = EthereumTransaction::from_payload(&object(eip1559())).unwrap();
        assert_eq!(tx.requested_variant(), TxVariant::FeeMarket);

        let mut unavailable = HashSet::new();
        assert_eq!(tx.effective_variant(&unavailable), TxVariant::FeeMarket);
        unavailable.insert(Capability::Eip712);
        assert_eq!(tx.effective_variant(&unavailable), TxVariant::FeeMarket);
        unavailable.insert(Capability::Eip1559);
        assert_eq!(tx.effective_variant(&unavailable), TxVariant::Legacy);

        match tx.clone().into_request(TxVariant::FeeMarket) {
            SignTxRequest::Eip1559(r) => {
                assert_eq!(r.max_fee_per_gas, "14");
                assert_eq!(r.max_priority_fee_per_gas, "00");
                assert_eq!(r.chain_id, 1);
                assert_eq!(r.access_list.len(), 1);
                assert_eq!(r.access_list[0].address, "de0b295669a9fd93d5f28d9ec85e40f4cb697bae");
                assert_eq!(r.access_list[0].storage_keys, vec!["03", "07"]);
            }
            r => panic!("unexpected {r:?}"),
        }

        match tx.into_request(TxVariant::Legacy) {
            SignTxRequest::Legacy(r) => {
                assert_eq!(r.gas_price, None);
                assert_eq!(r.chain_id, Some(1));
            }
            r => panic!("unexpected {r:?}"),
        }
    }

    fn validation_error(v: serde_json::Value) -> ValidationError {
        match EthereumTransaction::from_payload(&object(v)) {
            Err(Error::Validation(e)) => e,
            r => panic!("unexpected {r:?}"),
        }
    }

    #[test]
    fn test_invalid() {
        let mut tx = legacy();
        tx.as_object_mut().unwrap().remove("gasPrice");
        assert_eq!(validation_error(tx).field(), "gasPrice");

        let mut tx = eip1559();
        tx.as_object_mut().unwrap().remove("chainId");
        assert_eq!(validation_error(tx).field(), "chainId");

        let mut tx = legacy();
        tx["chainId"] = json!("1");
        assert!(matches!(
            validation_error(tx),
            ValidationError::WrongType { field, .. } if field == "chainId"
        ));

        let mut tx = eip1559();
        tx["maxPriorityFeePerGas"] = json!(null);
        assert_eq!(
            validation_error(tx),
            ValidationError::MissingField {
                field: "maxPriorityFeePerGas".into()
            }
        );

        // Only one fee ceiling: validated as legacy
        let mut tx = eip1559();
        tx.as_object_mut().unwrap().remove("maxFeePerGas");
        assert_eq!(validation_error(tx).field(), "gasPrice");

        let mut tx = eip1559();
        tx["accessList"] = json!([{ "address": "0x01" }]);
        assert_eq!(validation_error(tx).field(), "storageKeys");

        let mut tx = eip1559();
        tx["accessList"] = json!([{ "address": "0x01", "storageKeys": [1] }]);
        assert_eq!(validation_error(tx).field(), "storageKeys");

        let mut tx = legacy();
        tx["chainId"] = json!(-1);
        assert!(matches!(
            EthereumTransaction::from_payload(&object(tx)),
            Err(Error::InvalidInteger(f)) if f == "chainId"
        ));
    }
}
