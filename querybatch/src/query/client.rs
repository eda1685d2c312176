// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Batching query client

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::config::ClientConfig;
use super::fingerprint::{fingerprint, group_key};
use super::group::{GroupStatus, PendingGroup, Subscriber};
use super::transport::{QueryTransport, ResponseDecoder};
use super::{
    application_error, batch_failure_message, QueryError, QueryParams, QueryRequest, QueryResult,
};
use crate::cache::{CacheDirective, CacheStore, Clock, ResolvedCache, SystemClock};

/// Counters describing client activity
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientStats {
    /// Calls to `fetch_bulk` and `fetch_single`
    pub requests: u64,
    /// Subscribers answered from cache, up front or at dispatch time
    pub cache_hits: u64,
    /// Callers that joined an existing group
    pub deduplicated: u64,
    /// Batch calls made
    pub batches_sent: u64,
    /// Queries put on the wire, batched or single
    pub queries_sent: u64,
    pub transport_failures: u64,
}

#[derive(Default)]
struct StatsCounters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    deduplicated: AtomicU64,
    batches_sent: AtomicU64,
    queries_sent: AtomicU64,
    transport_failures: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ClientStats {
        ClientStats {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            queries_sent: self.queries_sent.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// The pending dispatch
struct DispatchTimer {
    deadline: Instant,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Registry, FIFO queue and timer, always mutated together under one lock
#[derive(Default)]
struct DispatchState {
    /// Queued groups only; a group leaves this map when it is drained
    groups: HashMap<String, PendingGroup>,
    queue: VecDeque<String>,
    timer: Option<DispatchTimer>,
    next_generation: u64,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn QueryTransport>,
    cache: Arc<CacheStore>,
    state: Mutex<DispatchState>,
    stats: StatsCounters,
    sweeper: Option<JoinHandle<()>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

/// Coalesces concurrent queries into batched, deduplicated, cached calls
///
/// Cheap to clone; clones share one registry, timer and cache. Batching
/// needs a tokio runtime: `fetch_bulk` spawns the dispatch timer.
///
/// # Examples
/// ```ignore
/// let client = BulkQueryClient::builder(ClientConfig::new("https://host/api")).build()?;
/// let nations = client
///     .fetch_bulk("nations", params([("alliance", "913")]), Some(CacheDirective::defaults()), None)
///     .await?;
/// ```
#[derive(Clone)]
pub struct BulkQueryClient {
    inner: Arc<ClientInner>,
}

/// Builder for `BulkQueryClient`
pub struct BulkQueryClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn QueryTransport>>,
    decoder: Option<ResponseDecoder>,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<Arc<CacheStore>>,
}

impl BulkQueryClientBuilder {
    /// Replace the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn QueryTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the response decoder of the default HTTP transport
    pub fn decoder(mut self, decoder: ResponseDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Clock for cache expiry when the builder opens the cache store
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use an existing cache store
    pub fn cache_store(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<BulkQueryClient, QueryError> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config, self.decoder)?,
        };

        let cache = match self.cache {
            Some(cache) => cache,
            None => {
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                Arc::new(CacheStore::open(&self.config.cache, clock))
            }
        };

        let sweeper = self.config.cache_sweep_interval_ms.and_then(|ms| {
            match tokio::runtime::Handle::try_current() {
                Ok(_) => Some(cache.spawn_sweeper(Duration::from_millis(ms))),
                Err(_) => {
                    log::warn!("No tokio runtime; periodic cache sweep disabled");
                    None
                }
            }
        });

        Ok(BulkQueryClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                transport,
                cache,
                state: Mutex::new(DispatchState::default()),
                stats: StatsCounters::default(),
                sweeper,
            }),
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(
    config: &ClientConfig,
    decoder: Option<ResponseDecoder>,
) -> Result<Arc<dyn QueryTransport>, QueryError> {
    let mut transport = super::transport::HttpTransport::new(config)?;
    if let Some(decoder) = decoder {
        transport = transport.with_decoder(decoder);
    }
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http"))]
fn default_transport(
    _config: &ClientConfig,
    _decoder: Option<ResponseDecoder>,
) -> Result<Arc<dyn QueryTransport>, QueryError> {
    Err(QueryError::Config(
        "no transport supplied and the http feature is disabled".to_string(),
    ))
}

impl BulkQueryClient {
    pub fn builder(config: ClientConfig) -> BulkQueryClientBuilder {
        BulkQueryClientBuilder {
            config,
            transport: None,
            decoder: None,
            clock: None,
            cache: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn cache_store(&self) -> &Arc<CacheStore> {
        &self.inner.cache
    }

    pub fn stats(&self) -> ClientStats {
        self.inner.stats.snapshot()
    }

    /// Groups waiting for dispatch
    pub fn queued_groups(&self) -> usize {
        self.inner.state.lock().groups.len()
    }

    /// Fill in a directive from the client defaults for this request
    pub fn resolve_cache(
        &self,
        directive: &CacheDirective,
        endpoint: &str,
        params: &QueryParams,
    ) -> ResolvedCache {
        directive.resolve(
            self.inner.config.default_cache_type,
            self.inner.config.default_cache_ttl_ms,
            || fingerprint(endpoint, params),
        )
    }

    pub fn load_from_cache(&self, cache: &ResolvedCache) -> Option<Value> {
        self.inner.cache.load(cache)
    }

    pub fn save_to_cache(&self, cache: &ResolvedCache, value: &Value) {
        self.inner.cache.save(cache, value)
    }

    pub fn remove_from_cache(&self, cache: &ResolvedCache) {
        self.inner.cache.remove(cache)
    }

    /// Queue a query for the next batch
    ///
    /// Identical queries (same fingerprint and cache mode) queued before the
    /// batch leaves share one network request. `batch_wait` overrides the
    /// configured window for this call; it can only pull the pending dispatch
    /// earlier. Only a transport failure yields `Err`.
    pub async fn fetch_bulk(
        &self,
        endpoint: &str,
        params: QueryParams,
        cache: Option<CacheDirective>,
        batch_wait: Option<Duration>,
    ) -> Result<QueryResult, QueryError> {
        let inner = &self.inner;
        StatsCounters::bump(&inner.stats.requests, 1);

        let fp = fingerprint(endpoint, &params);
        let resolved = cache.map(|directive| self.resolve_cache(&directive, endpoint, &params));

        if let Some(cache) = &resolved {
            if let Some(value) = inner.cache.load(cache) {
                StatsCounters::bump(&inner.stats.cache_hits, 1);
                return Ok(QueryResult::ok(value));
            }
        }

        let wait = batch_wait.unwrap_or_else(|| inner.config.batch_wait());
        let rx = inner.subscribe(QueryRequest::new(endpoint, params), fp, resolved, wait);
        rx.await.unwrap_or(Err(QueryError::Closed))
    }

    /// Send one query immediately, skipping the batching window
    ///
    /// Honors the same cache contract as `fetch_bulk`. An application-level
    /// error comes back as `Err(QueryError::Application)` and is not cached.
    pub async fn fetch_single(
        &self,
        endpoint: &str,
        params: QueryParams,
        cache: Option<CacheDirective>,
    ) -> Result<Value, QueryError> {
        let inner = &self.inner;
        StatsCounters::bump(&inner.stats.requests, 1);

        let resolved = cache.map(|directive| self.resolve_cache(&directive, endpoint, &params));
        if let Some(cache) = &resolved {
            if let Some(value) = inner.cache.load(cache) {
                StatsCounters::bump(&inner.stats.cache_hits, 1);
                return Ok(value);
            }
        }

        let request = QueryRequest::new(endpoint, params);
        StatsCounters::bump(&inner.stats.queries_sent, 1);
        let payload = match inner.transport.send_single(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                StatsCounters::bump(&inner.stats.transport_failures, 1);
                log::warn!("Query to {} failed: {}", endpoint, e);
                return Err(e);
            }
        };

        if let Some(message) = application_error(&payload) {
            return Err(QueryError::Application(message));
        }

        if let Some(cache) = &resolved {
            inner.cache.save(cache, &payload);
        }
        Ok(payload)
    }
}

impl ClientInner {
    /// Attach a subscriber to the queued group for this request, creating the
    /// group if needed, and make sure a dispatch is due within `wait`
    fn subscribe(
        self: &Arc<Self>,
        request: QueryRequest,
        fingerprint: String,
        cache: Option<ResolvedCache>,
        wait: Duration,
    ) -> tokio::sync::oneshot::Receiver<super::group::Outcome> {
        let key = group_key(&fingerprint, cache.is_some());
        let (subscriber, rx) = Subscriber::new(cache);

        let mut state = self.state.lock();
        match state.groups.get_mut(&key) {
            Some(group) => {
                debug_assert_eq!(group.status, GroupStatus::Queued);
                group.subscribers.push(subscriber);
                StatsCounters::bump(&self.stats.deduplicated, 1);
            }
            None => {
                let mut group = PendingGroup::new(key.clone(), request);
                group.subscribers.push(subscriber);
                state.groups.insert(key.clone(), group);
                state.queue.push_back(key);
            }
        }

        let batch_full = self
            .config
            .max_batch_size
            .map_or(false, |max| state.queue.len() >= max);
        let wait = if batch_full { Duration::ZERO } else { wait };
        self.schedule_locked(&mut state, wait);

        rx
    }

    /// Ensure a dispatch fires no later than `now + wait`
    fn schedule_locked(self: &Arc<Self>, state: &mut DispatchState, wait: Duration) {
        let deadline = Instant::now() + wait;

        if let Some(timer) = &state.timer {
            if timer.deadline <= deadline {
                return;
            }
            timer.handle.abort();
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.fire(generation);
        });

        state.timer = Some(DispatchTimer {
            deadline,
            generation,
            handle,
        });
    }

    /// Timer callback: clear the timer, drain a batch, hand it to its own task
    fn fire(self: &Arc<Self>, generation: u64) {
        let batch = {
            let mut state = self.state.lock();
            match &state.timer {
                Some(timer) if timer.generation == generation => {}
                // Superseded by an earlier deadline
                _ => return,
            }
            state.timer = None;
            self.drain_locked(&mut state)
        };

        if batch.is_empty() {
            return;
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.run_pass(batch).await });
    }

    /// Take up to `max_batch_size` queued groups in FIFO order
    fn drain_locked(&self, state: &mut DispatchState) -> Vec<PendingGroup> {
        let limit = self.config.max_batch_size.unwrap_or(usize::MAX);
        let mut drained = Vec::new();

        while drained.len() < limit {
            let Some(key) = state.queue.pop_front() else {
                break;
            };
            // Removing from the registry here is what keeps late callers out
            let Some(mut group) = state.groups.remove(&key) else {
                continue;
            };
            if group.status != GroupStatus::Queued {
                continue;
            }
            group.status = GroupStatus::Fetching;
            drained.push(group);
        }

        drained
    }

    async fn run_pass(self: Arc<Self>, groups: Vec<PendingGroup>) {
        let mut to_fetch = Vec::with_capacity(groups.len());
        for group in groups {
            match self.cached_value(&group) {
                Some(value) => {
                    StatsCounters::bump(&self.stats.cache_hits, group.subscribers.len() as u64);
                    group.resolve_all(QueryResult::ok(value));
                }
                None => to_fetch.push(group),
            }
        }

        if !to_fetch.is_empty() {
            let requests: Vec<QueryRequest> =
                to_fetch.iter().map(|group| group.request.clone()).collect();
            log::debug!("Dispatching batch of {} queries", requests.len());
            StatsCounters::bump(&self.stats.batches_sent, 1);
            StatsCounters::bump(&self.stats.queries_sent, requests.len() as u64);

            match self.transport.send_batch(&requests).await {
                Ok(payload) => self.settle_batch(to_fetch, payload),
                Err(e) => {
                    log::warn!("Batch of {} queries failed: {}", requests.len(), e);
                    StatsCounters::bump(&self.stats.transport_failures, 1);
                    for group in to_fetch {
                        group.reject_all(e.clone());
                    }
                }
            }
        }

        let mut state = self.state.lock();
        if !state.queue.is_empty() {
            self.schedule_locked(&mut state, Duration::ZERO);
        }
    }

    /// Last-moment cache check; a concurrent pass may have filled it
    fn cached_value(&self, group: &PendingGroup) -> Option<Value> {
        group
            .distinct_caches()
            .into_iter()
            .find_map(|cache| self.cache.load(cache))
    }

    fn settle_batch(&self, groups: Vec<PendingGroup>, payload: Value) {
        let Some(results) = payload.get("results").and_then(Value::as_array) else {
            let message = batch_failure_message(&payload);
            log::warn!("Malformed batch response: {}", message);
            for group in groups {
                group.resolve_all(QueryResult::failed(message.clone()));
            }
            return;
        };

        for (index, group) in groups.into_iter().enumerate() {
            let value = match results.get(index) {
                Some(value) if !value.is_null() => value,
                _ => {
                    let message = format!(
                        "No result for {} at batch index {}",
                        group.request.endpoint, index
                    );
                    group.resolve_all(QueryResult::failed(message));
                    continue;
                }
            };

            if let Some(message) = application_error(value) {
                log::debug!("Query {} returned an error: {}", group.key, message);
                group.resolve_all(QueryResult::failed(message));
                continue;
            }

            for cache in group.distinct_caches() {
                self.cache.save(cache, value);
            }
            group.resolve_all(QueryResult::ok(value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::params;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTransport;

    #[async_trait]
    impl QueryTransport for EchoTransport {
        async fn send_batch(&self, requests: &[QueryRequest]) -> Result<Value, QueryError> {
            let results: Vec<Value> = requests.iter().map(|r| json!(r.endpoint)).collect();
            Ok(json!({ "results": results }))
        }

        async fn send_single(&self, request: &QueryRequest) -> Result<Value, QueryError> {
            Ok(json!(request.endpoint))
        }
    }

    fn client(max_batch_size: Option<usize>) -> BulkQueryClient {
        let mut config = ClientConfig::default();
        config.max_batch_size = max_batch_size;
        BulkQueryClient::builder(config)
            .transport(Arc::new(EchoTransport))
            .cache_store(Arc::new(CacheStore::in_memory()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.max_batch_size = Some(0);
        let result = BulkQueryClient::builder(config)
            .transport(Arc::new(EchoTransport))
            .build();
        assert!(matches!(result, Err(QueryError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_takes_fifo_prefix_and_clears_registry() {
        let client = client(Some(2));
        let inner = &client.inner;

        let mut receivers = Vec::new();
        {
            let mut state = inner.state.lock();
            for endpoint in ["a", "b", "c"] {
                let (subscriber, rx) = Subscriber::new(None);
                let key = group_key(&fingerprint(endpoint, &QueryParams::new()), false);
                let mut group =
                    PendingGroup::new(key.clone(), QueryRequest::new(endpoint, QueryParams::new()));
                group.subscribers.push(subscriber);
                state.groups.insert(key.clone(), group);
                state.queue.push_back(key);
                receivers.push(rx);
            }

            let drained = inner.drain_locked(&mut state);
            let endpoints: Vec<&str> = drained.iter().map(|g| g.request.endpoint.as_str()).collect();
            assert_eq!(endpoints, vec!["a", "b"]);
            assert!(drained.iter().all(|g| g.status == GroupStatus::Fetching));
            assert_eq!(state.groups.len(), 1);
            assert_eq!(state.queue.len(), 1);
        }
        assert_eq!(client.queued_groups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_single_caches_payload() {
        let client = client(None);
        let cache = CacheDirective::defaults();

        let first = client
            .fetch_single("nations", params([("id", "1")]), Some(cache.clone()))
            .await
            .unwrap();
        assert_eq!(first, json!("nations"));

        let resolved = client.resolve_cache(&cache, "nations", &params([("id", "1")]));
        assert_eq!(client.load_from_cache(&resolved), Some(json!("nations")));

        client
            .fetch_single("nations", params([("id", "1")]), Some(cache))
            .await
            .unwrap();
        let stats = client.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.queries_sent, 1);
    }
}
