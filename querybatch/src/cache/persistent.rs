// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Local and session storage cache backends
//!
//! Both store `{"data": ..., "expiresAt": ms}` JSON blobs in a
//! `StorageTree`; they differ only in where the tree lives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::backend::CacheBackend;
use super::clock::Clock;
use super::{CacheResult, CacheType};
use crate::storage::StorageTree;

/// Blob layout shared by both storage kinds
///
/// Older writers used `expires`; it is still accepted on read.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBlob {
    data: Value,
    #[serde(rename = "expiresAt", alias = "expires")]
    expires_at: i64,
}

/// Cache backend over a byte key/value tree
pub struct PersistentCache {
    cache_type: CacheType,
    tree: Box<dyn StorageTree>,
    clock: Arc<dyn Clock>,
}

impl PersistentCache {
    /// `cache_type` should be `LocalStorage` or `SessionStorage`
    pub fn new(cache_type: CacheType, tree: Box<dyn StorageTree>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_type,
            tree,
            clock,
        }
    }

    /// Write raw bytes under `key`, bypassing the blob format
    pub fn set_raw(&self, key: &str, bytes: &[u8]) -> CacheResult<()> {
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}

impl Drop for PersistentCache {
    fn drop(&mut self) {
        if let Err(e) = self.tree.flush() {
            log::warn!("Failed to flush {} cache: {}", self.cache_type, e);
        }
    }
}

impl CacheBackend for PersistentCache {
    fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let bytes = match self.tree.get(key.as_bytes())? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let blob: StoredBlob = match serde_json::from_slice(&bytes) {
            Ok(blob) => blob,
            Err(e) => {
                log::debug!(
                    "Removing corrupt {} entry '{}': {}",
                    self.cache_type,
                    key,
                    e
                );
                self.tree.remove(key.as_bytes())?;
                return Ok(None);
            }
        };

        if blob.expires_at <= self.clock.now_ms() {
            self.tree.remove(key.as_bytes())?;
            return Ok(None);
        }

        Ok(Some(blob.data))
    }

    fn set(&self, key: &str, value: &Value, ttl_ms: i64) -> CacheResult<()> {
        let blob = StoredBlob {
            data: value.clone(),
            expires_at: self.clock.now_ms().saturating_add(ttl_ms),
        };
        let bytes = serde_json::to_vec(&blob)?;
        self.tree.insert(key.as_bytes(), &bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.tree.remove(key.as_bytes())?;
        Ok(())
    }

    fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now_ms();
        let mut removed = 0;

        for key in self.tree.keys()? {
            let stale = match self.tree.get(&key)? {
                Some(bytes) => match serde_json::from_slice::<StoredBlob>(&bytes) {
                    Ok(blob) => blob.expires_at <= now,
                    Err(_) => true,
                },
                None => false,
            };
            if stale {
                self.tree.remove(&key)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.tree.len()?)
    }

    fn clear(&self) -> CacheResult<()> {
        self.tree.clear()?;
        Ok(())
    }
}
