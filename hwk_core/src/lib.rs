#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Hardware wallet methods: validation of the untrusted call payloads, resolution of the
//! firmware versions a method can run on and execution against a [`DeviceSession`].
//!
//! A host builds an [`AnyMethod`] from a [`CoreMessage`], checks the permissions and the
//! firmware range, then runs it on the session of the connected device.

pub mod consts;
pub mod device;
pub mod error;
pub mod ethereum_sign_tx;
pub mod method;
pub mod params;
pub mod path;
pub mod payload;
pub mod protocol;

pub use consts::{MIN_ETHEREUM_PATH_LENGTH, SIGN_TX_LABEL};
pub use device::{Capability, DeviceSession};
pub use error::Error;
pub use ethereum_sign_tx::{EthereumSignTransaction, EthereumTransaction, TxVariant};
pub use method::{AnyMethod, CoreMessage, Method, MethodContext, MethodName, Permission, Response};
pub use params::{validate_params, FieldSchema, FieldType, ValidationError};
pub use path::{derivation_path_to_vec, validate_path};
pub use payload::{Object, Value};

pub type Result<T> = std::result::Result<T, error::Error>;
