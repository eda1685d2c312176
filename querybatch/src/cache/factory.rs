// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Cache backend factory

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::backend::CacheBackend;
use super::clock::Clock;
use super::cookie::{CookieJar, DEFAULT_MAX_COOKIE_BYTES};
use super::memory::MemoryCache;
use super::persistent::PersistentCache;
use super::{CacheResult, CacheType};
use crate::storage::{open_storage_tree, StorageLocation};

const LOCAL_STORAGE_TREE: &str = "local_storage";
const SESSION_STORAGE_TREE: &str = "session_storage";

/// Where the storage-backed caches keep their data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStoreOptions {
    /// Directory for durable local storage; `None` keeps it in memory
    pub local_storage_path: Option<PathBuf>,

    /// Byte quota for in-memory local/session storage
    pub storage_quota_bytes: Option<usize>,

    /// Back session storage with a temporary sled database instead of a map
    pub session_on_disk: bool,

    pub max_cookie_bytes: usize,
}

impl Default for CacheStoreOptions {
    fn default() -> Self {
        Self {
            local_storage_path: None,
            storage_quota_bytes: Some(5 * 1024 * 1024), // 5MB, the usual browser quota
            session_on_disk: false,
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
        }
    }
}

impl CacheStoreOptions {
    fn local_location(&self) -> StorageLocation {
        match &self.local_storage_path {
            Some(path) => StorageLocation::Durable(path.clone()),
            None => StorageLocation::InMemory {
                quota_bytes: self.storage_quota_bytes,
            },
        }
    }

    fn session_location(&self) -> StorageLocation {
        if self.session_on_disk {
            StorageLocation::Session
        } else {
            StorageLocation::InMemory {
                quota_bytes: self.storage_quota_bytes,
            }
        }
    }
}

/// Build the backend for one cache type
pub fn create_cache_backend(
    cache_type: CacheType,
    options: &CacheStoreOptions,
    clock: Arc<dyn Clock>,
) -> CacheResult<Arc<dyn CacheBackend>> {
    let backend: Arc<dyn CacheBackend> = match cache_type {
        CacheType::Memory => Arc::new(MemoryCache::new(clock)),
        CacheType::Cookie => Arc::new(CookieJar::new(clock, options.max_cookie_bytes)),
        CacheType::LocalStorage => {
            let tree = open_storage_tree(&options.local_location(), LOCAL_STORAGE_TREE)?;
            log::debug!("{} cache on {} storage", cache_type, tree.storage_type());
            Arc::new(PersistentCache::new(cache_type, tree, clock))
        }
        CacheType::SessionStorage => {
            let tree = open_storage_tree(&options.session_location(), SESSION_STORAGE_TREE)?;
            log::debug!("{} cache on {} storage", cache_type, tree.storage_type());
            Arc::new(PersistentCache::new(cache_type, tree, clock))
        }
    };
    Ok(backend)
}
