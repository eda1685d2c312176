// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Cookie-jar cache backend
//!
//! Mirrors browser cookie semantics: string name, JSON-serialized string
//! value, an absolute expiry enforced by the jar itself, and a per-cookie
//! size ceiling.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::CacheBackend;
use super::clock::Clock;
use super::{CacheError, CacheResult, CacheType};

/// Browsers cap a single cookie (name + value) at about 4 KiB
pub const DEFAULT_MAX_COOKIE_BYTES: usize = 4096;

#[derive(Debug, Clone)]
struct Cookie {
    value: String,
    expires_at: i64,
}

pub struct CookieJar {
    cookies: RwLock<HashMap<String, Cookie>>,
    max_cookie_bytes: usize,
    clock: Arc<dyn Clock>,
}

impl CookieJar {
    pub fn new(clock: Arc<dyn Clock>, max_cookie_bytes: usize) -> Self {
        Self {
            cookies: RwLock::new(HashMap::new()),
            max_cookie_bytes,
            clock,
        }
    }

    /// Raw cookie string, bypassing JSON decoding
    pub fn raw(&self, name: &str) -> Option<String> {
        let now = self.clock.now_ms();
        self.cookies
            .read()
            .get(name)
            .filter(|c| c.expires_at > now)
            .map(|c| c.value.clone())
    }

    /// Expiry of a live cookie, as a browser would render its `Expires`
    /// attribute
    pub fn expires(&self, name: &str) -> Option<DateTime<Utc>> {
        let now = self.clock.now_ms();
        let expires_at = self
            .cookies
            .read()
            .get(name)
            .filter(|c| c.expires_at > now)?
            .expires_at;
        Utc.timestamp_millis_opt(expires_at).single()
    }

    /// Store a raw cookie string as-is
    ///
    /// A rejected write still evicts the previous cookie under `name`, so a
    /// later read never sees a value older than the last write.
    pub fn set_raw(&self, name: &str, value: String, ttl_ms: i64) -> CacheResult<()> {
        let size = name.len() + value.len();
        if size > self.max_cookie_bytes {
            self.cookies.write().remove(name);
            return Err(CacheError::CookieTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_cookie_bytes,
            });
        }

        let cookie = Cookie {
            value,
            expires_at: self.clock.now_ms().saturating_add(ttl_ms),
        };
        self.cookies.write().insert(name.to_string(), cookie);
        Ok(())
    }
}

impl CacheBackend for CookieJar {
    fn cache_type(&self) -> CacheType {
        CacheType::Cookie
    }

    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = self.clock.now_ms();
        let mut cookies = self.cookies.write();

        let raw = match cookies.get(key) {
            None => return Ok(None),
            Some(cookie) if cookie.expires_at <= now => {
                cookies.remove(key);
                return Ok(None);
            }
            Some(cookie) => cookie.value.clone(),
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::debug!("Dropping unparsable cookie '{}': {}", key, e);
                cookies.remove(key);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &Value, ttl_ms: i64) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw, ttl_ms)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.cookies.write().remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now_ms();
        let mut cookies = self.cookies.write();
        let before = cookies.len();
        cookies.retain(|_, c| c.expires_at > now);
        Ok(before - cookies.len())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.cookies.read().len())
    }

    fn clear(&self) -> CacheResult<()> {
        self.cookies.write().clear();
        Ok(())
    }
}
