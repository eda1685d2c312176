// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! querybatch - the data layer behind a dashboard UI
//!
//! # Features
//!
//! - **Batched queries**: concurrent `(endpoint, params)` requests collected
//!   over a short window and sent as one network call
//! - **Deduplication**: identical in-flight requests share one result
//! - **TTL caching**: memory, cookie, durable and session-scoped backends
//! - **Table sort**: multi-key sort with typed comparators, short-circuiting
//!   of repeated sorts and a parallel keyed path for large tables
//!
//! # Usage
//!
//! ```ignore
//! use querybatch::{params, BulkQueryClient, CacheDirective, ClientConfig};
//!
//! let client = BulkQueryClient::builder(ClientConfig::new("https://host/api")).build()?;
//! let result = client
//!     .fetch_bulk("nations", params([("id", "7")]), Some(CacheDirective::defaults()), None)
//!     .await?;
//! ```

pub mod cache;
pub mod query;
pub mod sort;
pub mod storage;

pub use cache::{CacheDirective, CacheStore, CacheType, ResolvedCache};
pub use query::{
    params, BulkQueryClient, BulkQueryClientBuilder, ClientConfig, ClientStats, QueryError,
    QueryParams, QueryRequest, QueryResult, QueryTransport, QueryValue,
};
pub use sort::{
    sort, Cell, ColumnConfig, ColumnType, NullPlacement, Row, SortDirection, SortDirective,
    SortOptions, SortOutcome,
};

/// querybatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// querybatch crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
