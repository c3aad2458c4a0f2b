//! The contract every operation implements, and the registry of operations.
//!
//! A method is built from an inbound [`CoreMessage`]: construction validates the payload and
//! resolves the firmware range, failing as a whole on the first error. The caller then checks
//! [`Method::required_permissions`] and [`Method::firmware_range`] against the user and the
//! connected device, and finally consumes the method with [`Method::run`].

use std::str::FromStr;

use async_trait::async_trait;
use hwk_common::{CoinRegistry, Config, FirmwareRange};
use serde::{Deserialize, Serialize};

use crate::device::DeviceSession;
use crate::ethereum_sign_tx::EthereumSignTransaction;
use crate::params::{validate_params, FieldSchema, FieldType};
use crate::payload::{Object, Value};
use crate::protocol::EthereumSignedTx;
use crate::Result;

#[derive(Debug, thiserror::Error)]
#[error("The method '{name}' does not exist")]
pub struct MethodNotExist {
    name: String,
}

/// Capability tags the user must grant before a method runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(enum_iterator::Sequence))]
pub enum MethodName {
    EthereumSignTransaction,
}

impl FromStr for MethodName {
    type Err = MethodNotExist;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "ethereumSignTransaction" => MethodName::EthereumSignTransaction,
            _ => {
                return Err(MethodNotExist {
                    name: s.to_string(),
                })
            }
        })
    }
}

impl std::fmt::Display for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MethodName::EthereumSignTransaction => "ethereumSignTransaction",
        };
        write!(f, "{}", s)
    }
}

/// A call as received from the host application
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoreMessage {
    pub payload: Object,
}

impl CoreMessage {
    pub fn new(payload: Object) -> Self {
        Self { payload }
    }

    /// The requested method name, if the payload has one
    pub fn method(&self) -> Option<&str> {
        self.payload.get("method").and_then(Value::as_str)
    }
}

/// Data loaded by the caller that methods consult while being built
#[derive(Debug, Clone, Copy)]
pub struct MethodContext<'a> {
    pub coins: &'a CoinRegistry,
    pub config: &'a Config,
}

impl<'a> MethodContext<'a> {
    pub fn new(coins: &'a CoinRegistry, config: &'a Config) -> Self {
        Self { coins, config }
    }
}

#[async_trait]
pub trait Method: Sized + Send {
    type Output: Serialize + Send;

    fn name(&self) -> MethodName;

    fn required_permissions(&self) -> &[Permission];

    /// Firmware versions allowed to run this method, per device model
    fn firmware_range(&self) -> &FirmwareRange;

    /// Human readable description of what the method does
    fn info(&self) -> &str;

    /// Execute the method on the device. Errors of the session are returned as they are.
    async fn run<S: DeviceSession>(
        self,
        session: &mut S,
    ) -> std::result::Result<Self::Output, S::Error>;
}

/// Result of any method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    EthereumSignedTx(EthereumSignedTx),
}

/// Any of the known methods, selected by the `method` field of the payload
#[derive(Debug)]
pub enum AnyMethod {
    EthereumSignTransaction(EthereumSignTransaction),
}

impl AnyMethod {
    pub fn from_message(message: &CoreMessage, ctx: &MethodContext<'_>) -> Result<Self> {
        validate_params(
            &message.payload,
            &[FieldSchema::new("method")
                .typed(FieldType::String)
                .obligatory()],
        )?;
        let name: MethodName = message.method().unwrap_or_default().parse()?;
        log::debug!("building method {name}");

        let method = match name {
            MethodName::EthereumSignTransaction => {
                AnyMethod::EthereumSignTransaction(EthereumSignTransaction::new(message, ctx)?)
            }
        };
        log::info!("{name}: {}", method.info());
        Ok(method)
    }
}

#[async_trait]
impl Method for AnyMethod {
    type Output = Response;

    fn name(&self) -> MethodName {
        match self {
            AnyMethod::EthereumSignTransaction(m) => m.name(),
        }
    }

    fn required_permissions(&self) -> &[Permission] {
        match self {
            AnyMethod::EthereumSignTransaction(m) => m.required_permissions(),
        }
    }

    fn firmware_range(&self) -> &FirmwareRange {
        match self {
            AnyMethod::EthereumSignTransaction(m) => m.firmware_range(),
        }
    }

    fn info(&self) -> &str {
        match self {
            AnyMethod::EthereumSignTransaction(m) => m.info(),
        }
    }

    async fn run<S: DeviceSession>(
        self,
        session: &mut S,
    ) -> std::result::Result<Response, S::Error> {
        match self {
            AnyMethod::EthereumSignTransaction(m) => {
                Ok(Response::EthereumSignedTx(m.run(session).await?))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use enum_iterator::all;

    use super::*;
    use crate::Error;

    #[test]
    fn method_roundtrip() {
        let all = all::<MethodName>().collect::<Vec<_>>();
        for m in all {
            assert_eq!(m, m.to_string().parse().unwrap())
        }
    }

    #[test]
    fn test_unknown_method() {
        let err = "signEverything".parse::<MethodName>().unwrap_err();
        assert_eq!(err.to_string(), "The method 'signEverything' does not exist");

        let coins = CoinRegistry::default();
        let config = Config::default();
        let ctx = MethodContext::new(&coins, &config);

        let message: CoreMessage =
            serde_json::from_value(serde_json::json!({ "payload": { "method": "nope" } }))
                .unwrap();
        assert!(matches!(
            AnyMethod::from_message(&message, &ctx),
            Err(Error::MethodNotExist(_))
        ));

        let message = CoreMessage::default();
        assert!(matches!(
            AnyMethod::from_message(&message, &ctx),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_permission_display() {
        assert_eq!(Permission::Read.to_string(), "read");
        assert_eq!(
            serde_json::to_value([Permission::Read, Permission::Write]).unwrap(),
            serde_json::json!(["read", "write"])
        );
    }
}
