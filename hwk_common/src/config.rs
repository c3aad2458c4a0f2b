use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoinInfo, Error, Model};

/// A rule field accepting either one value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleOrMulti {
    Single(String),
    Multi(Vec<String>),
}

impl SingleOrMulti {
    /// ASCII case-insensitive membership
    pub fn contains(&self, value: &str) -> bool {
        match self {
            SingleOrMulti::Single(s) => s.eq_ignore_ascii_case(value),
            SingleOrMulti::Multi(v) => v.iter().any(|s| s.eq_ignore_ascii_case(value)),
        }
    }
}

/// An operator supplied correction to the firmware range computed for a method.
///
/// `min` and `max` are indexed by model: the first entry is for model `1`, the second for model
/// `2` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrideRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<SingleOrMulti>,

    /// Despite the name, restricts the rule to the listed methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_methods: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<String>>,
}

impl ConfigOverrideRule {
    /// True if the rule is not scoped to a coin or a coin type
    pub fn is_generic(&self) -> bool {
        self.coin_type.is_none() && self.coin.is_none()
    }

    fn matches_coin(&self, coin: &CoinInfo) -> bool {
        if self.is_generic() {
            return true;
        }
        let by_type = self.coin_type.as_deref() == Some(coin.coin_type.as_str());
        let by_shortcut = self
            .coin
            .as_ref()
            .is_some_and(|c| c.contains(&coin.shortcut));
        by_type || by_shortcut
    }

    fn matches_method(&self, method: &str) -> bool {
        match &self.excluded_methods {
            Some(methods) => methods.iter().any(|m| m == method),
            None => true,
        }
    }

    /// Whether the rule must be applied when resolving the range of `method` for `coin`
    pub fn applies_to(&self, method: &str, coin: &CoinInfo) -> bool {
        self.matches_coin(coin) && self.matches_method(method)
    }

    pub fn min_for(&self, model: Model) -> Option<&str> {
        self.min.as_ref()?.get(model.index()).map(String::as_str)
    }

    pub fn max_for(&self, model: Model) -> Option<&str> {
        self.max.as_ref()?.get(model.index()).map(String::as_str)
    }
}

/// Library configuration, as loaded from the `config.json` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub supported_firmware: Vec<ConfigOverrideRule>,
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(s)?;
        log::debug!(
            "loaded config with {} firmware rules",
            config.supported_firmware.len()
        );
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
