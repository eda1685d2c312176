// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Key/value store trait
//!
//! Persistent cache backends are written against this trait so the same
//! expiry and blob logic runs over sled or a plain map.

use super::types::{StorageResult, StorageType};

/// A named collection of byte key/value pairs
pub trait StorageTree: Send + Sync {
    /// Insert a key-value pair, replacing any previous value
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Get a value by key
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Remove a key-value pair
    fn remove(&self, key: &[u8]) -> StorageResult<()>;

    /// Clear all data in the tree
    fn clear(&self) -> StorageResult<()>;

    /// Number of stored entries
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of all keys
    fn keys(&self) -> StorageResult<Vec<Vec<u8>>>;

    /// Flush any pending writes
    fn flush(&self) -> StorageResult<()>;

    /// Storage technology behind this tree
    fn storage_type(&self) -> StorageType;
}

// Lets Box<dyn StorageTree> be passed wherever a StorageTree is expected
impl StorageTree for Box<dyn StorageTree> {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).insert(key, value)
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }

    fn len(&self) -> StorageResult<usize> {
        (**self).len()
    }

    fn keys(&self) -> StorageResult<Vec<Vec<u8>>> {
        (**self).keys()
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }

    fn storage_type(&self) -> StorageType {
        (**self).storage_type()
    }
}
