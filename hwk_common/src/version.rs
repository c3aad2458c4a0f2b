//! Dotted firmware versions, such as `"2.4.2"`.
//!
//! Versions are kept as the strings the device, the coin registry and the configuration use.
//! The lone `"0"` is not a version but the [`UNBOUNDED`] sentinel.

use std::cmp::Ordering;

/// Sentinel standing for "no bound", both as a minimum and as a maximum.
pub const UNBOUNDED: &str = "0";

/// Return true if the given bound is the [`UNBOUNDED`] sentinel.
pub fn is_unbounded(version: &str) -> bool {
    version.trim() == UNBOUNDED
}

fn components(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|c| c.trim().parse().unwrap_or(0))
        .collect()
}

/// Compare two dotted versions numerically, component by component.
///
/// The shorter version is padded with zeros, so `"2.4"` equals `"2.4.0"`.
/// Components that are not numbers count as `0`.
pub fn version_compare(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Raise `current` to `candidate`.
///
/// An unbounded `current` is always replaced, otherwise the greater version wins.
pub(crate) fn raise(current: &str, candidate: &str) -> String {
    if is_unbounded(current) || version_compare(candidate, current) == Ordering::Greater {
        candidate.to_string()
    } else {
        current.to_string()
    }
}

/// Apply a configuration rule bound to `current`.
///
/// Like [`raise`], except that an unbounded `rule` always wins: a rule can lift a bound.
pub(crate) fn override_bound(current: &str, rule: &str) -> String {
    if is_unbounded(rule) {
        rule.trim().to_string()
    } else {
        raise(current, rule)
    }
}
