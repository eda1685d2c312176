//! Client wired to a MockTransport and a manual clock

use querybatch::cache::{CacheStoreOptions, ManualClock};
use querybatch::{BulkQueryClient, CacheStore, ClientConfig};
use std::sync::Arc;

use super::mock_transport::MockTransport;

pub struct ClientFixture {
    pub client: BulkQueryClient,
    pub transport: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
}

impl ClientFixture {
    pub fn new(transport: MockTransport) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: MockTransport, config: ClientConfig) -> Self {
        super::init_logging();
        let transport = Arc::new(transport);
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache = Arc::new(CacheStore::open(&CacheStoreOptions::default(), clock.clone()));

        let client = BulkQueryClient::builder(config)
            .transport(transport.clone())
            .cache_store(cache)
            .build()
            .expect("Failed to build client");

        Self {
            client,
            transport,
            clock,
        }
    }

    pub fn with_max_batch_size(transport: MockTransport, max: usize) -> Self {
        let mut config = ClientConfig::default();
        config.max_batch_size = Some(max);
        Self::with_config(transport, config)
    }
}
