// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Cache backend trait

use serde_json::Value;

use super::{CacheResult, CacheType};

/// A TTL key/value store for query results
///
/// Implementations own their clock. An entry is live while
/// `now < written_at + ttl_ms`; `get` on an expired entry deletes it and
/// reports a miss, so no sweep is needed for correctness.
pub trait CacheBackend: Send + Sync {
    /// Which of the four storage kinds this is
    fn cache_type(&self) -> CacheType;

    /// Live value under `key`, if any
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store `value` under `key` for `ttl_ms` milliseconds
    fn set(&self, key: &str, value: &Value, ttl_ms: i64) -> CacheResult<()>;

    fn remove(&self, key: &str) -> CacheResult<()>;

    /// Drop every expired entry, returning how many were removed
    fn purge_expired(&self) -> CacheResult<usize>;

    /// Number of stored entries, expired ones included
    fn len(&self) -> CacheResult<usize>;

    fn clear(&self) -> CacheResult<()>;
}
