// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Canonical JSON encoding and SHA-256 hashing (spec §6, §9: "String-keyed JSON hashing is
//! formalized: define a canonical encoder ... used only for `inputsSha256` and dedupe keys").
//!
//! `serde_json::Map` is backed by a `BTreeMap` by default (the `preserve_order` feature is not
//! enabled anywhere in this workspace), so object keys are already sorted on serialization; the
//! remaining canonicalization work is normalizing `-0.0` to `0.0` before formatting numbers, per
//! the hash-stability invariant in spec §8.

use sha2::{Digest, Sha256};

/// Recursively normalize `-0.0` floats to `0.0` so that hash stability (spec §8) holds
/// regardless of how an upstream computation produced a signed zero.
fn normalize(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(f) = n.as_f64()
                && f == 0.0
            {
                *n = serde_json::Number::from_f64(0.0).expect("0.0 is always representable");
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                normalize(item);
            }
        }
        serde_json::Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                normalize(v);
            }
        }
        _ => {}
    }
}

/// Serialize `value` to the canonical encoding used for `inputsSha256` and dedupe keys: sorted
/// object keys, `-0.0`/`0.0` normalized.
pub fn canonical_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let mut v = serde_json::to_value(value)?;
    normalize(&mut v);
    serde_json::to_string(&v)
}

/// Lowercase hex SHA-256 digest over UTF-8 bytes (spec §6).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hash a value's canonical JSON encoding. Used for `inputsSha256` and `rateStructureSha`.
pub fn hash_canonical<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let encoded = canonical_json(value)?;
    Ok(sha256_hex(encoded.as_bytes()))
}

/// Format a kWh quantity to the 6-decimal fixed precision spec §3's `EstimateInputs` requires.
pub fn format_kwh_6dp(kwh: f64) -> String {
    format!("{kwh:.6}")
}

/// Format a cents/kWh quantity to hundredths precision (spec §4.3: "¢/kWh in hundredths").
pub fn round_cents_per_kwh(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a dollar quantity to integer cents (spec §4.3: "dollars to cents").
pub fn round_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({"b": 1, "a": 2});
        let encoded = canonical_json(&value).unwrap();
        assert_eq!(encoded, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_canonical_json_normalizes_negative_zero() {
        let a = json!({"x": -0.0_f64});
        let b = json!({"x": 0.0_f64});
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn test_hash_canonical_stable_under_key_reorder() {
        let a = json!({"bucketKeys": ["b", "a"], "x": 1});
        let b = json!({"x": 1, "bucketKeys": ["b", "a"]});
        assert_eq!(hash_canonical(&a).unwrap(), hash_canonical(&b).unwrap());
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(9.95), 995);
        assert_eq!(round_to_cents(8.0), 800);
    }

    #[test]
    fn test_format_kwh_6dp() {
        assert_eq!(format_kwh_6dp(1234.5), "1234.500000");
    }
}
