// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Network transport seam
//!
//! The client only needs "send these queries, give me the decoded payload".
//! `HttpTransport` does that over HTTP with reqwest; tests plug in doubles.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{QueryError, QueryRequest};

/// Turns a response body into a dynamic value
pub type ResponseDecoder = Arc<dyn Fn(&[u8]) -> Result<Value, QueryError> + Send + Sync>;

/// MessagePack bodies, the server's default encoding
pub fn msgpack_decoder() -> ResponseDecoder {
    Arc::new(|bytes: &[u8]| {
        rmp_serde::from_slice::<Value>(bytes).map_err(|e| QueryError::Decode(e.to_string()))
    })
}

/// JSON bodies
pub fn json_decoder() -> ResponseDecoder {
    Arc::new(|bytes: &[u8]| {
        serde_json::from_slice::<Value>(bytes).map_err(|e| QueryError::Decode(e.to_string()))
    })
}

/// Sends queries to the backend
///
/// Any `Err` from `send_batch` rejects every subscriber of the batch.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Send one batch; the payload is expected to be `{ "results": [...] }`
    /// aligned with `requests`
    async fn send_batch(&self, requests: &[QueryRequest]) -> Result<Value, QueryError>;

    /// Send a single query to its own endpoint
    async fn send_single(&self, request: &QueryRequest) -> Result<Value, QueryError>;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use crate::query::{ClientConfig, CredentialsMode};
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
    use std::time::Duration;

    const ACCEPT_MSGPACK: &str = "application/msgpack";

    /// reqwest-backed transport
    ///
    /// Batches go to `POST <base>/<batch_path>` as the form field
    /// `queries=<JSON [[endpoint, params], ...]>`; single queries post their
    /// params form-encoded to `<base>/<endpoint>`.
    pub struct HttpTransport {
        client: reqwest::Client,
        config: ClientConfig,
        decoder: ResponseDecoder,
    }

    impl HttpTransport {
        pub fn new(config: &ClientConfig) -> Result<Self, QueryError> {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MSGPACK));
            for (name, value) in &config.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| QueryError::Config(format!("header '{}': {}", name, e)))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| QueryError::Config(format!("header value: {}", e)))?;
                headers.insert(name, value);
            }

            let mut builder = reqwest::Client::builder()
                .default_headers(headers)
                .cookie_store(config.credentials == CredentialsMode::Include);
            if let Some(timeout) = config.request_timeout_ms {
                builder = builder.timeout(Duration::from_millis(timeout));
            }

            let client = builder
                .build()
                .map_err(|e| QueryError::Config(e.to_string()))?;

            Ok(Self {
                client,
                config: config.clone(),
                decoder: msgpack_decoder(),
            })
        }

        pub fn with_decoder(mut self, decoder: ResponseDecoder) -> Self {
            self.decoder = decoder;
            self
        }

        async fn post_form(
            &self,
            url: &str,
            form: &[(String, String)],
        ) -> Result<Value, QueryError> {
            let response = self
                .client
                .post(url)
                .form(form)
                .send()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(QueryError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?;
            (self.decoder)(&bytes)
        }
    }

    #[async_trait]
    impl QueryTransport for HttpTransport {
        async fn send_batch(&self, requests: &[QueryRequest]) -> Result<Value, QueryError> {
            let queries =
                serde_json::to_string(requests).map_err(|e| QueryError::Decode(e.to_string()))?;
            let form = [("queries".to_string(), queries)];
            self.post_form(&self.config.batch_url(), &form).await
        }

        async fn send_single(&self, request: &QueryRequest) -> Result<Value, QueryError> {
            let url = self.config.endpoint_url(&request.endpoint);
            self.post_form(&url, &request.form_pairs()).await
        }
    }

}
