// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Sled-backed key/value tree

use super::traits::StorageTree;
use super::types::{StorageError, StorageResult, StorageType};
use std::path::Path;

/// Sled tree wrapper that implements the StorageTree trait
///
/// Holds the owning `sled::Db` so a temporary database lives exactly as long
/// as the tree handle.
pub struct SledTree {
    _db: sled::Db,
    tree: sled::Tree,
}

fn backend(e: sled::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

impl SledTree {
    /// Open (or create) a named tree in an on-disk database
    pub fn open<P: AsRef<Path>>(path: P, name: &str) -> StorageResult<Self> {
        let db = sled::open(path).map_err(backend)?;
        let tree = db.open_tree(name).map_err(backend)?;
        Ok(Self { _db: db, tree })
    }

    /// Open a named tree in a temporary database removed on drop
    pub fn temporary(name: &str) -> StorageResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(backend)?;
        let tree = db.open_tree(name).map_err(backend)?;
        Ok(Self { _db: db, tree })
    }
}

impl StorageTree for SledTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.tree
            .get(key)
            .map_err(backend)
            .map(|opt| opt.map(|v| v.to_vec()))
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.tree.remove(key).map_err(backend)?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.tree.clear().map_err(backend)
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.tree.len())
    }

    fn keys(&self) -> StorageResult<Vec<Vec<u8>>> {
        self.tree
            .iter()
            .keys()
            .map(|k| k.map(|k| k.to_vec()).map_err(backend))
            .collect()
    }

    fn flush(&self) -> StorageResult<()> {
        self.tree.flush().map_err(backend)?;
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Sled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_durable_tree_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let tree = SledTree::open(temp_dir.path(), "local").unwrap();
            tree.insert(b"key", b"value").unwrap();
            tree.flush().unwrap();
        }

        let tree = SledTree::open(temp_dir.path(), "local").unwrap();
        assert_eq!(tree.get(b"key").unwrap(), Some(b"value".to_vec()));
        assert_eq!(tree.keys().unwrap(), vec![b"key".to_vec()]);
    }

    #[test]
    fn test_temporary_tree() {
        let tree = SledTree::temporary("session").unwrap();
        tree.insert(b"a", b"1").unwrap();
        assert_eq!(tree.len().unwrap(), 1);
        tree.clear().unwrap();
        assert!(tree.is_empty().unwrap());
    }
}
