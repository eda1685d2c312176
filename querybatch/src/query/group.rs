// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Pending request groups and their subscribers

use tokio::sync::oneshot;

use super::{QueryError, QueryRequest, QueryResult};
use crate::cache::ResolvedCache;

pub(crate) type Outcome = Result<QueryResult, QueryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupStatus {
    Queued,
    Fetching,
}

/// One waiting caller
pub(crate) struct Subscriber {
    pub cache: Option<ResolvedCache>,
    tx: oneshot::Sender<Outcome>,
}

impl Subscriber {
    pub fn new(cache: Option<ResolvedCache>) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { cache, tx }, rx)
    }

    fn settle(self, outcome: Outcome) {
        // The caller may have stopped waiting; nothing to do then
        let _ = self.tx.send(outcome);
    }
}

/// Callers sharing one upcoming network request
///
/// Lives in the client registry only while `Queued`. Draining removes it from
/// the registry and marks it `Fetching` in the same critical section, so no
/// caller can join a group whose request is already on the wire.
pub(crate) struct PendingGroup {
    pub key: String,
    pub request: QueryRequest,
    pub status: GroupStatus,
    pub subscribers: Vec<Subscriber>,
}

impl PendingGroup {
    pub fn new(key: String, request: QueryRequest) -> Self {
        Self {
            key,
            request,
            status: GroupStatus::Queued,
            subscribers: Vec::new(),
        }
    }

    /// Each distinct `(cache type, key)` requested by the subscribers, first
    /// requester's TTL winning
    pub fn distinct_caches(&self) -> Vec<&ResolvedCache> {
        let mut caches: Vec<&ResolvedCache> = Vec::new();
        for cache in self.subscribers.iter().filter_map(|s| s.cache.as_ref()) {
            let seen = caches
                .iter()
                .any(|c| c.cache_type == cache.cache_type && c.key == cache.key);
            if !seen {
                caches.push(cache);
            }
        }
        caches
    }

    pub fn resolve_all(self, result: QueryResult) {
        self.settle_all(Ok(result));
    }

    pub fn reject_all(self, error: QueryError) {
        self.settle_all(Err(error));
    }

    fn settle_all(self, outcome: Outcome) {
        for subscriber in self.subscribers {
            subscriber.settle(outcome.clone());
        }
    }
}
