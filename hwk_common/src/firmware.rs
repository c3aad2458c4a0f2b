//! Firmware ranges: which firmware versions of each device model may run a method.
//!
//! The range of a method starts from a default given by the method itself, then it is
//! tightened by the coin registry and finally corrected by the configuration rules, see
//! [`resolve_firmware_range()`].

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::version::{override_bound, raise, UNBOUNDED};
use crate::{CoinInfo, ConfigOverrideRule, Error};

/// A device hardware/firmware family, identified by a number starting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Model(u8);

impl Model {
    pub const ONE: Model = Model(1);
    pub const TWO: Model = Model(2);

    pub fn new(id: u8) -> Result<Self, Error> {
        if id == 0 {
            return Err(Error::InvalidModel(id.to_string()));
        }
        Ok(Model(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    /// Position of this model in per-model lists such as the config `min` and `max`
    pub(crate) fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u8 = s.parse().map_err(|_| Error::InvalidModel(s.to_string()))?;
        Model::new(id)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let string = String::deserialize(d)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

/// Lower and upper firmware bound for one model, `"0"` meaning unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub min: String,
    pub max: String,
}

impl VersionRange {
    pub fn new(min: &str, max: &str) -> Self {
        Self {
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

/// Per-model firmware bounds of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmwareRange(BTreeMap<Model, VersionRange>);

impl FirmwareRange {
    /// A range without any model
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, model: Model, range: VersionRange) -> Self {
        self.0.insert(model, range);
        self
    }

    pub fn get(&self, model: Model) -> Option<&VersionRange> {
        self.0.get(&model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Model, &VersionRange)> {
        self.0.iter()
    }
}

/// The range every method starts from: model 1 from `1.0.0`, model 2 from `2.0.0`, no maximum.
impl Default for FirmwareRange {
    fn default() -> Self {
        Self::empty()
            .with(Model::ONE, VersionRange::new("1.0.0", UNBOUNDED))
            .with(Model::TWO, VersionRange::new("2.0.0", UNBOUNDED))
    }
}

impl FromIterator<(Model, VersionRange)> for FirmwareRange {
    fn from_iter<T: IntoIterator<Item = (Model, VersionRange)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Compute the firmware range allowed to run `method`.
///
/// Without `coin_info` the `default` range is returned as is. Otherwise each model minimum
/// is raised to the coin minimum, or reset to unbounded when the coin registry has no support
/// data for that model. Then the first configuration rule applying to `method` and the coin
/// raises the minimums and maximums it declares, a rule bound of `"0"` lifts that bound.
///
/// Never fails, missing data degrades to the unbounded sentinel.
pub fn resolve_firmware_range(
    method: &str,
    coin_info: Option<&CoinInfo>,
    default: &FirmwareRange,
    rules: Option<&[ConfigOverrideRule]>,
) -> FirmwareRange {
    let mut current = default.clone();
    let Some(coin) = coin_info else {
        return current;
    };

    for (model, range) in current.0.iter_mut() {
        range.min = match coin.min_firmware(*model) {
            Some(min) => raise(&range.min, min),
            None => UNBOUNDED.to_string(),
        };
    }

    let rule = rules
        .unwrap_or_default()
        .iter()
        .find(|r| r.applies_to(method, coin));
    if let Some(rule) = rule {
        log::debug!("{method} for {}: applying config rule {rule:?}", coin.shortcut);
        for (model, range) in current.0.iter_mut() {
            if let Some(min) = rule.min_for(*model) {
                range.min = override_bound(&range.min, min);
            }
            if let Some(max) = rule.max_for(*model) {
                range.max = override_bound(&range.max, max);
            }
        }
    }

    log::debug!("{method} for {}: firmware range {current:?}", coin.shortcut);
    current
}
