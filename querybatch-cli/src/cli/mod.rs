// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for querybatch
//!
//! Sorts JSON tables from disk and runs one-off queries through the batching
//! client.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_fetch, handle_sort};
