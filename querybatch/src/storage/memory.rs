// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory key/value tree with an optional byte quota

use super::traits::StorageTree;
use super::types::{StorageError, StorageResult, StorageType};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory tree implementation
///
/// A quota, when set, bounds the summed key+value bytes; inserts that would
/// exceed it fail with `QuotaExceeded` the way a full browser store does.
pub struct MemoryTree {
    data: RwLock<TreeData>,
    quota_bytes: Option<usize>,
}

#[derive(Default)]
struct TreeData {
    entries: HashMap<Vec<u8>, Vec<u8>>,
    /// Summed key+value bytes of `entries`
    used_bytes: usize,
}

impl TreeData {
    fn entry_size(key: &[u8], value: &[u8]) -> usize {
        key.len() + value.len()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(TreeData::default()),
            quota_bytes: None,
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            data: RwLock::new(TreeData::default()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> usize {
        self.data.read().used_bytes
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageTree for MemoryTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        let replaced = data
            .entries
            .get(key)
            .map(|v| TreeData::entry_size(key, v))
            .unwrap_or(0);
        let used = data.used_bytes - replaced;
        let requested = TreeData::entry_size(key, value);

        if let Some(quota) = self.quota_bytes {
            if used + requested > quota {
                return Err(StorageError::QuotaExceeded {
                    quota,
                    used,
                    requested,
                });
            }
        }

        data.entries.insert(key.to_vec(), value.to_vec());
        data.used_bytes = used + requested;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().entries.get(key).cloned())
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        if let Some(value) = data.entries.remove(key) {
            data.used_bytes -= TreeData::entry_size(key, &value);
        }
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.data.write() = TreeData::default();
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.data.read().entries.len())
    }

    fn keys(&self) -> StorageResult<Vec<Vec<u8>>> {
        Ok(self.data.read().entries.keys().cloned().collect())
    }

    fn flush(&self) -> StorageResult<()> {
        // No-op for memory storage
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let tree = MemoryTree::new();
        tree.insert(b"a", b"1").unwrap();
        assert_eq!(tree.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(tree.len().unwrap(), 1);

        tree.remove(b"a").unwrap();
        assert_eq!(tree.get(b"a").unwrap(), None);
        assert!(tree.is_empty().unwrap());
    }

    #[test]
    fn test_quota_rejects_oversized_insert() {
        let tree = MemoryTree::with_quota(8);
        tree.insert(b"k", b"1234").unwrap();

        let err = tree.insert(b"j", b"123456").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 8, .. }));

        // Replacing an existing key only counts the difference
        tree.insert(b"k", b"1234567").unwrap();
        assert_eq!(tree.get(b"k").unwrap(), Some(b"1234567".to_vec()));
        assert_eq!(tree.used_bytes(), 8);
    }

    #[test]
    fn test_used_bytes_follow_every_mutation() {
        let tree = MemoryTree::with_quota(10);
        tree.insert(b"a", b"123").unwrap();
        tree.insert(b"b", b"1234").unwrap();
        assert_eq!(tree.used_bytes(), 9);

        // A rejected insert leaves the count alone
        assert!(tree.insert(b"c", b"12").is_err());
        assert_eq!(tree.used_bytes(), 9);

        tree.remove(b"a").unwrap();
        tree.remove(b"missing").unwrap();
        assert_eq!(tree.used_bytes(), 5);

        // Freed space is usable again
        tree.insert(b"c", b"1234").unwrap();
        assert_eq!(tree.used_bytes(), 10);

        tree.clear().unwrap();
        assert_eq!(tree.used_bytes(), 0);
        assert!(tree.is_empty().unwrap());
    }
}
