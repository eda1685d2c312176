// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Storage types and error handling
//!
//! Defines where a key/value store lives and the errors its operations raise.

use std::path::PathBuf;
use thiserror::Error;

/// Storage technology behind a key/value tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Sled - pure Rust embedded database, survives restarts
    Sled,

    /// Memory - process-local map, optionally capped in size
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Sled => "sled",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Where a store should be opened
///
/// `Durable` corresponds to browser local storage (kept across runs),
/// `Session` to session storage (discarded when the store is dropped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// On-disk store at the given directory
    Durable(PathBuf),
    /// Store whose contents are discarded on drop
    Session,
    /// Plain in-memory map with an optional byte quota
    InMemory { quota_bytes: Option<usize> },
}

/// Error type for key/value store operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: {used} of {quota} bytes in use, {requested} requested")]
    QuotaExceeded {
        quota: usize,
        used: usize,
        requested: usize,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for key/value store operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_display() {
        assert_eq!(StorageType::Sled.to_string(), "sled");
        assert_eq!(StorageType::Memory.to_string(), "memory");
    }

    #[test]
    fn test_quota_error_message() {
        let err = StorageError::QuotaExceeded {
            quota: 8,
            used: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded: 5 of 8 bytes in use, 6 requested"
        );
    }
}
