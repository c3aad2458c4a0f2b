use std::str::FromStr;

use bitcoin::bip32::DerivationPath;

use crate::payload::Value;
use crate::{Error, Result};

pub fn derivation_path_to_vec(path: &DerivationPath) -> Vec<u32> {
    path.into_iter().map(|e| (*e).into()).collect()
}

/// Read a derivation path given either as a list of indexes or as a string like
/// `m/44'/60'/0'/0/0` (`h` is accepted as hardened marker too).
///
/// The path must have at least `min_len` components.
pub fn validate_path(value: &Value, min_len: usize) -> Result<Vec<u32>> {
    let path = match value {
        Value::String(s) => {
            let path = DerivationPath::from_str(s.trim())?;
            derivation_path_to_vec(&path)
        }
        Value::Array(items) => items
            .iter()
            .map(index_from_value)
            .collect::<Result<Vec<u32>>>()?,
        other => return Err(Error::InvalidPath(format!("unexpected {}", other.kind()))),
    };

    if path.len() < min_len {
        return Err(Error::InvalidPath(format!(
            "expected at least {min_len} components, got {}",
            path.len()
        )));
    }
    Ok(path)
}

fn index_from_value(value: &Value) -> Result<u32> {
    let index = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    index
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| Error::InvalidPath(format!("invalid index {value:?}")))
}

#[cfg(test)]
mod test {
    use hwk_common::HARDENED;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate_path() {
        let expected = vec![44 | HARDENED, 60 | HARDENED, HARDENED, 0, 0];

        let s = Value::from("m/44'/60'/0'/0/0");
        assert_eq!(validate_path(&s, 3).unwrap(), expected);
        let s = Value::from("m/44h/60h/0h/0/0");
        assert_eq!(validate_path(&s, 3).unwrap(), expected);

        let a: Value = json!([44 | HARDENED, 60 | HARDENED, HARDENED, 0, "0"]).into();
        assert_eq!(validate_path(&a, 3).unwrap(), expected);
    }

    #[test]
    fn test_invalid_path() {
        let short = Value::from("m/44'/60'");
        assert!(matches!(validate_path(&short, 3), Err(Error::InvalidPath(_))));
        assert_eq!(validate_path(&short, 2).unwrap().len(), 2);

        assert!(matches!(
            validate_path(&Value::from("m/44'/abc/0"), 3),
            Err(Error::Bip32(_))
        ));

        let a: Value = json!([44, -1, 0]).into();
        assert!(matches!(validate_path(&a, 3), Err(Error::InvalidPath(_))));
        let a: Value = json!([44, 1u64 << 32, 0]).into();
        assert!(matches!(validate_path(&a, 3), Err(Error::InvalidPath(_))));
        let a: Value = json!([44, "x", 0]).into();
        assert!(matches!(validate_path(&a, 3), Err(Error::InvalidPath(_))));

        assert!(matches!(
            validate_path(&Value::from(44u64), 3),
            Err(Error::InvalidPath(_))
        ));
    }
}
