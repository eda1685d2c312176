// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Backend-dispatching cache accessors

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::backend::CacheBackend;
use super::clock::{Clock, SystemClock};
use super::factory::{create_cache_backend, CacheStoreOptions};
use super::{CacheError, CacheResult, CacheType, ResolvedCache};

/// The four cache backends behind one facade
///
/// Every public accessor is infallible: backend errors (quota, disabled
/// storage, corrupt data) are logged and treated as a miss or a no-op.
pub struct CacheStore {
    backends: HashMap<CacheType, Arc<dyn CacheBackend>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Open all four backends; one that fails to open is logged and left out
    pub fn open(options: &CacheStoreOptions, clock: Arc<dyn Clock>) -> Self {
        let mut backends = HashMap::new();
        for cache_type in CacheType::ALL {
            match create_cache_backend(cache_type, options, clock.clone()) {
                Ok(backend) => {
                    backends.insert(cache_type, backend);
                }
                Err(e) => log::warn!("{} cache unavailable: {}", cache_type, e),
            }
        }
        Self { backends, clock }
    }

    /// All backends in memory with the system clock
    pub fn in_memory() -> Self {
        Self::open(&CacheStoreOptions::default(), Arc::new(SystemClock))
    }

    /// Build from explicit backends, e.g. test doubles
    pub fn from_backends(backends: Vec<Arc<dyn CacheBackend>>, clock: Arc<dyn Clock>) -> Self {
        let backends = backends
            .into_iter()
            .map(|backend| (backend.cache_type(), backend))
            .collect();
        Self { backends, clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn backend(&self, cache_type: CacheType) -> CacheResult<&Arc<dyn CacheBackend>> {
        self.backends
            .get(&cache_type)
            .ok_or(CacheError::Unavailable(cache_type))
    }

    /// Live value for `cache`, or `None` on miss or any backend failure
    pub fn load(&self, cache: &ResolvedCache) -> Option<Value> {
        let result = self
            .backend(cache.cache_type)
            .and_then(|backend| backend.get(&cache.key));
        match result {
            Ok(hit) => {
                if hit.is_none() {
                    log::debug!("Cache miss: {} '{}'", cache.cache_type, cache.key);
                }
                hit
            }
            Err(e) => {
                log::debug!(
                    "Cache read failed for {} '{}': {}",
                    cache.cache_type,
                    cache.key,
                    e
                );
                None
            }
        }
    }

    /// Store `value` for `cache.ttl_ms`; a TTL of zero or less removes the key
    pub fn save(&self, cache: &ResolvedCache, value: &Value) {
        if cache.ttl_ms <= 0 {
            self.remove(cache);
            return;
        }

        let result = self
            .backend(cache.cache_type)
            .and_then(|backend| backend.set(&cache.key, value, cache.ttl_ms));
        if let Err(e) = result {
            log::warn!(
                "Cache write failed for {} '{}': {}",
                cache.cache_type,
                cache.key,
                e
            );
        }
    }

    pub fn remove(&self, cache: &ResolvedCache) {
        let result = self
            .backend(cache.cache_type)
            .and_then(|backend| backend.remove(&cache.key));
        if let Err(e) = result {
            log::debug!(
                "Cache remove failed for {} '{}': {}",
                cache.cache_type,
                cache.key,
                e
            );
        }
    }

    /// Sweep expired entries from every backend
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for backend in self.backends.values() {
            match backend.purge_expired() {
                Ok(count) => removed += count,
                Err(e) => log::warn!("Sweep of {} cache failed: {}", backend.cache_type(), e),
            }
        }
        if removed > 0 {
            log::debug!("Swept {} expired cache entries", removed);
        }
        removed
    }

    pub fn clear(&self) {
        for backend in self.backends.values() {
            if let Err(e) = backend.clear() {
                log::warn!("Clearing {} cache failed: {}", backend.cache_type(), e);
            }
        }
    }

    /// Entry count per backend
    pub fn entry_counts(&self) -> Vec<(CacheType, usize)> {
        CacheType::ALL
            .iter()
            .filter_map(|cache_type| {
                let backend = self.backends.get(cache_type)?;
                Some((*cache_type, backend.len().unwrap_or(0)))
            })
            .collect()
    }

    /// Periodically purge expired entries until the handle is aborted
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                store.purge_expired();
            }
        })
    }
}
