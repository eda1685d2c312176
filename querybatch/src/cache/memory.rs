// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Process-memory cache backend

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::CacheBackend;
use super::clock::Clock;
use super::{CacheResult, CacheType};

#[derive(Debug, Clone)]
struct MemoryEntry {
    expires_at: i64,
    data: Value,
}

/// In-process key → `{expires_at, data}` map
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl CacheBackend for MemoryCache {
    fn cache_type(&self) -> CacheType {
        CacheType::Memory
    }

    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = self.clock.now_ms();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.data.clone())),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a fresh value may have landed meanwhile
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.data.clone()));
            }
            entries.remove(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: &Value, ttl_ms: i64) -> CacheResult<()> {
        let entry = MemoryEntry {
            expires_at: self.clock.now_ms().saturating_add(ttl_ms),
            data: value.clone(),
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.entries.read().len())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use serde_json::json;

    #[test]
    fn test_expired_read_deletes_entry() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = MemoryCache::new(clock.clone());

        cache.set("k", &json!({"a": 1}), 100).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(json!({"a": 1})));

        clock.advance(100);
        assert_eq!(cache.get("k").unwrap(), None);
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = MemoryCache::new(clock.clone());

        cache.set("short", &json!(1), 10).unwrap();
        cache.set("long", &json!(2), 1_000).unwrap();
        clock.advance(50);

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.get("long").unwrap(), Some(json!(2)));
    }
}
