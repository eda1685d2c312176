//! Test utilities for querybatch integration tests
//!
//! - MockTransport: scripted, recording stand-in for the HTTP transport
//! - ClientFixture: a client wired to a MockTransport and a manual clock
//! - sample_rows: generated table data for sort tests

#![allow(dead_code)]

pub mod client_fixture;
pub mod mock_transport;
pub mod sample_rows;

/// Route library logs through the test harness; RUST_LOG picks the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
