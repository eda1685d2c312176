//! Recording transport double
//!
//! Every call is recorded with its (paused-clock) start time. Responses come
//! from a responder closure; an optional delay simulates the round trip.

use async_trait::async_trait;
use parking_lot::Mutex;
use querybatch::{QueryError, QueryRequest, QueryTransport};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub type Responder = Arc<dyn Fn(&[QueryRequest]) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub requests: Vec<QueryRequest>,
    pub single: bool,
}

pub struct MockTransport {
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// The value the echo responder returns for `request`
pub fn echo_value(request: &QueryRequest) -> Value {
    json!({ "endpoint": request.endpoint, "params": request.params })
}

impl MockTransport {
    /// Answers every query with `echo_value`
    pub fn echo() -> Self {
        Self::with_responder(|requests| {
            let results: Vec<Value> = requests.iter().map(echo_value).collect();
            Ok(json!({ "results": results }))
        })
    }

    /// Fails every call with a transport error
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with_responder(move |_| Err(QueryError::Transport(message.clone())))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[QueryRequest]) -> Result<Value, QueryError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every response for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn batch_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| !c.single).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn respond(&self, requests: Vec<QueryRequest>, single: bool) -> Result<Value, QueryError> {
        let response = (self.responder)(&requests);
        self.calls.lock().push(RecordedCall {
            at: Instant::now(),
            requests,
            single,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn send_batch(&self, requests: &[QueryRequest]) -> Result<Value, QueryError> {
        self.respond(requests.to_vec(), false).await
    }

    async fn send_single(&self, request: &QueryRequest) -> Result<Value, QueryError> {
        let payload = self.respond(vec![request.clone()], true).await?;
        match payload.get("results").and_then(|r| r.get(0)) {
            Some(value) => Ok(value.clone()),
            None => Ok(payload),
        }
    }
}
