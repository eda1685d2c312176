// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Stable request fingerprints

use super::QueryParams;

/// Order-independent identity of `(endpoint, params)`
///
/// Keys are emitted sorted, list values keep their order. The result is also
/// the default cache key.
pub fn fingerprint(endpoint: &str, params: &QueryParams) -> String {
    // BTreeMap serializes in key order; string-only values cannot fail
    let canonical = serde_json::to_string(params).unwrap_or_default();
    format!("{}?{}", endpoint, canonical)
}

/// Registry key for a pending group: caching and non-caching callers of the
/// same fingerprint never share a group
pub(crate) fn group_key(fingerprint: &str, caching: bool) -> String {
    let mode = if caching { "cached" } else { "direct" };
    format!("{}#{}", fingerprint, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{params, QueryValue};

    #[test]
    fn test_key_order_is_irrelevant() {
        let a = params([("nation", "1"), ("turn", "5"), ("alliance", "9")]);
        let b = params([("alliance", "9"), ("nation", "1"), ("turn", "5")]);
        assert_eq!(fingerprint("war", &a), fingerprint("war", &b));
    }

    #[test]
    fn test_list_order_is_preserved() {
        let a = params([("ids", QueryValue::from(vec!["1", "2"]))]);
        let b = params([("ids", QueryValue::from(vec!["2", "1"]))]);
        assert_ne!(fingerprint("war", &a), fingerprint("war", &b));
    }

    #[test]
    fn test_endpoint_and_values_matter() {
        let a = params([("id", "1")]);
        let b = params([("id", "2")]);
        assert_ne!(fingerprint("war", &a), fingerprint("nation", &a));
        assert_ne!(fingerprint("war", &a), fingerprint("war", &b));
        assert_eq!(fingerprint("war", &a), r#"war?{"id":"1"}"#);
    }

    #[test]
    fn test_group_key_separates_cache_modes() {
        let fp = fingerprint("war", &params([("id", "1")]));
        assert_ne!(group_key(&fp, true), group_key(&fp, false));
    }
}
