#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing common code used in multiple other crate in the workspace, such as:
//!
//!  * Firmware versions and per-model firmware ranges, and the resolution of the range a method
//!    is allowed to run on: [`resolve_firmware_range()`].
//!  * Coin registry data ([`CoinInfo`], [`CoinRegistry`]) and the library [`Config`].
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

mod coin;
mod config;
mod error;
pub mod firmware;
pub mod version;

pub use crate::coin::{
    network_label, CoinInfo, CoinRegistry, CoinSupport, HARDENED, NETWORK_PLACEHOLDER,
};
pub use crate::config::{Config, ConfigOverrideRule, SingleOrMulti};
pub use crate::error::Error;
pub use crate::firmware::{resolve_firmware_range, FirmwareRange, Model, VersionRange};
pub use crate::version::{is_unbounded, version_compare, UNBOUNDED};
