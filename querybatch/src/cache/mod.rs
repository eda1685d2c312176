// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! TTL caching for query results
//!
//! Four interchangeable backends sit behind the `CacheBackend` trait:
//! - process memory
//! - a cookie jar
//! - durable local storage
//! - session-scoped storage
//!
//! `CacheStore` dispatches on `CacheType` and swallows backend failures, so
//! a broken or full store only ever looks like a cache miss.

pub mod backend;
pub mod clock;
pub mod cookie;
pub mod factory;
pub mod memory;
pub mod persistent;
pub mod store;

pub use backend::CacheBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use cookie::CookieJar;
pub use factory::{create_cache_backend, CacheStoreOptions};
pub use memory::MemoryCache;
pub use persistent::PersistentCache;
pub use store::CacheStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Storage kind a cached value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    Memory,
    Cookie,
    LocalStorage,
    SessionStorage,
}

impl CacheType {
    pub const ALL: [CacheType; 4] = [
        CacheType::Memory,
        CacheType::Cookie,
        CacheType::LocalStorage,
        CacheType::SessionStorage,
    ];
}

impl Default for CacheType {
    fn default() -> Self {
        CacheType::Memory
    }
}

impl std::str::FromStr for CacheType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "memory" => Ok(CacheType::Memory),
            "cookie" => Ok(CacheType::Cookie),
            "local" | "local_storage" | "localstorage" => Ok(CacheType::LocalStorage),
            "session" | "session_storage" | "sessionstorage" => Ok(CacheType::SessionStorage),
            _ => Err(format!(
                "Unknown cache type: {}. Valid options: memory, cookie, local_storage, session_storage",
                s
            )),
        }
    }
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CacheType::Memory => "memory",
            CacheType::Cookie => "cookie",
            CacheType::LocalStorage => "local_storage",
            CacheType::SessionStorage => "session_storage",
        };
        write!(f, "{}", name)
    }
}

/// Per-call cache request
///
/// Unset fields fall back to the client defaults; an unset key falls back to
/// `endpoint + fingerprint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    pub cache_type: Option<CacheType>,
    pub ttl_ms: Option<i64>,
    pub key: Option<String>,
}

impl CacheDirective {
    pub fn new(cache_type: CacheType, ttl_ms: i64) -> Self {
        Self {
            cache_type: Some(cache_type),
            ttl_ms: Some(ttl_ms),
            key: None,
        }
    }

    /// Use the client's default cache type and TTL
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn resolve(
        &self,
        default_type: CacheType,
        default_ttl_ms: i64,
        default_key: impl FnOnce() -> String,
    ) -> ResolvedCache {
        ResolvedCache {
            cache_type: self.cache_type.unwrap_or(default_type),
            ttl_ms: self.ttl_ms.unwrap_or(default_ttl_ms),
            key: self.key.clone().unwrap_or_else(default_key),
        }
    }
}

/// A cache directive with every field decided
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedCache {
    pub cache_type: CacheType,
    pub ttl_ms: i64,
    pub key: String,
}

impl ResolvedCache {
    pub fn new(cache_type: CacheType, key: impl Into<String>, ttl_ms: i64) -> Self {
        Self {
            cache_type,
            ttl_ms,
            key: key.into(),
        }
    }
}

/// Cache backend errors
///
/// These never reach callers of the query client; `CacheStore` logs and
/// drops them.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cookie '{name}' is {size} bytes, limit is {limit}")]
    CookieTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("Cache backend {0} is not available")]
    Unavailable(CacheType),
}

pub type CacheResult<T> = Result<T, CacheError>;
