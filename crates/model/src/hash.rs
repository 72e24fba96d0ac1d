//! The one shared implementation of `canonical_json(sorted(items))` and
//! `data_hash` (§4.1, P1, P3, Design Notes). Both `switchwatch-db` (to
//! decide whether a batch changed) and `switchwatch-core` (parsers/tests)
//! call into this — it must never be reimplemented per collection type.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialise `items` to JSON values, sort them into a canonical order that
/// does not depend on input order (P1), and join them into one string.
/// `serde_json::Value`'s object map is a `BTreeMap` (this crate does not
/// enable the `preserve_order` feature anywhere in the workspace), so
/// object keys are already sorted; only the array order needs fixing up.
pub fn canonical_json<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    let mut values = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    values.sort_by(|a, b| {
        serde_json::to_string(a)
            .unwrap_or_default()
            .cmp(&serde_json::to_string(b).unwrap_or_default())
    });
    serde_json::to_string(&values)
}

/// `truncate(SHA-256(canonical_json(sorted(items))), 16 hex)`.
pub fn data_hash<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(items)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(hex::encode(digest)[..16].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        name: String,
        value: i32,
    }

    #[test]
    fn hash_is_stable_under_permutation() {
        let a = vec![
            Item { name: "b".into(), value: 2 },
            Item { name: "a".into(), value: 1 },
        ];
        let b = vec![
            Item { name: "a".into(), value: 1 },
            Item { name: "b".into(), value: 2 },
        ];
        assert_eq!(data_hash(&a).unwrap(), data_hash(&b).unwrap());
    }

    #[test]
    fn hash_changes_when_a_field_changes() {
        let a = vec![Item { name: "a".into(), value: 1 }];
        let b = vec![Item { name: "a".into(), value: 2 }];
        assert_ne!(data_hash(&a).unwrap(), data_hash(&b).unwrap());
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let a = vec![Item { name: "a".into(), value: 1 }];
        assert_eq!(data_hash(&a).unwrap().len(), 16);
    }
}
