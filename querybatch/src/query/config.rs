// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Query client configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::QueryError;
use crate::cache::{CacheStoreOptions, CacheType};

/// Whether cookies travel with requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsMode {
    Include,
    Omit,
}

impl Default for CredentialsMode {
    fn default() -> Self {
        CredentialsMode::Include
    }
}

/// Construction-time settings for `BulkQueryClient`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: String,

    /// Path of the batch endpoint
    pub batch_path: String,

    /// Default batching window
    pub batch_wait_ms: u64,

    /// Dispatch immediately once this many groups are queued
    pub max_batch_size: Option<usize>,

    /// Cache type for directives that leave it unset
    pub default_cache_type: CacheType,

    /// TTL for directives that leave it unset
    pub default_cache_ttl_ms: i64,

    pub credentials: CredentialsMode,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout, if any
    pub request_timeout_ms: Option<u64>,

    /// Storage options for the cache backends
    pub cache: CacheStoreOptions,

    /// Background sweep of expired cache entries
    pub cache_sweep_interval_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            batch_path: "query".to_string(),
            batch_wait_ms: 50,
            max_batch_size: None,
            default_cache_type: CacheType::Memory,
            default_cache_ttl_ms: 60_000, // 1 minute
            credentials: CredentialsMode::Include,
            headers: BTreeMap::new(),
            request_timeout_ms: None,
            cache: CacheStoreOptions::default(),
            cache_sweep_interval_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, QueryError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| QueryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn batch_wait(&self) -> Duration {
        Duration::from_millis(self.batch_wait_ms)
    }

    pub fn batch_url(&self) -> String {
        self.endpoint_url(&self.batch_path)
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.base_url.trim().is_empty() {
            return Err(QueryError::Config("base_url must not be empty".to_string()));
        }

        if self.batch_path.trim().is_empty() {
            return Err(QueryError::Config(
                "batch_path must not be empty".to_string(),
            ));
        }

        if self.max_batch_size == Some(0) {
            return Err(QueryError::Config(
                "max_batch_size must be > 0 when set".to_string(),
            ));
        }

        if self.cache_sweep_interval_ms == Some(0) {
            return Err(QueryError::Config(
                "cache_sweep_interval_ms must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
