// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Batched, deduplicated query client
//!
//! Many concurrent callers ask for `(endpoint, params)` pairs. Identical
//! requests share one pending group, groups accumulate for a short batching
//! window, and one network call carries the whole batch. Results fan back
//! out to every subscriber, optionally through a TTL cache.
//!
//! ```text
//! fetch_bulk ──► cache hit? ──► QueryResult
//!      │
//!      ▼
//! PendingGroup (per fingerprint + cache mode) ◄── later identical callers
//!      │  dispatch timer (earliest deadline wins)
//!      ▼
//! QueryTransport::send_batch ──► positional results ──► subscribers
//! ```

pub mod client;
pub mod config;
pub mod fingerprint;
pub(crate) mod group;
pub mod transport;

pub use client::{BulkQueryClient, BulkQueryClientBuilder, ClientStats};
pub use config::{ClientConfig, CredentialsMode};
pub use fingerprint::fingerprint;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{json_decoder, msgpack_decoder, QueryTransport, ResponseDecoder};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A query parameter value: one string or an ordered list of strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::One(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::One(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Query parameters, kept sorted by key
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Build `QueryParams` from `(key, value)` pairs in any order
pub fn params<I, K, V>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<QueryValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// One `(endpoint, params)` pair as sent over the wire
///
/// Serializes as a two-element array `[endpoint, params]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub endpoint: String,
    pub params: QueryParams,
}

impl QueryRequest {
    pub fn new(endpoint: impl Into<String>, params: QueryParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    /// Params flattened for form encoding; list values repeat their key
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            match value {
                QueryValue::One(v) => pairs.push((key.clone(), v.clone())),
                QueryValue::Many(vs) => {
                    pairs.extend(vs.iter().map(|v| (key.clone(), v.clone())));
                }
            }
        }
        pairs
    }
}

impl Serialize for QueryRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.endpoint, &self.params).serialize(serializer)
    }
}

/// Settled outcome of a batched query
///
/// Exactly one of `data` / `error` is set. Application-level failures and
/// malformed batch responses arrive here as `error`; only transport failures
/// surface as `Err(QueryError)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl QueryResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Deserialize `data` into `T`, turning a carried error into `Err`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        if let Some(message) = &self.error {
            return Err(QueryError::Application(message.clone()));
        }
        let data = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| QueryError::Decode(e.to_string()))
    }
}

/// Query client errors
///
/// `Clone` so a single transport failure can be delivered to every
/// subscriber of a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Application(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request was dropped before it settled")]
    Closed,
}

/// Message carried by an application-level error payload
///
/// Any object with `success == false` is an error; the message comes from
/// `error`, then `message`, else the whole payload.
pub fn application_error(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.get("success") != Some(&Value::Bool(false)) {
        return None;
    }
    Some(message_of(value))
}

/// Error text for a batch payload without a `results` array
pub(crate) fn batch_failure_message(payload: &Value) -> String {
    match payload.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => format!("Invalid batch response: {}", payload),
    }
}

fn message_of(value: &Value) -> String {
    ["error", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
