// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Storage tree factory
//!
//! Picks a tree implementation for a `StorageLocation`.

use super::memory::MemoryTree;
use super::traits::StorageTree;
use super::types::StorageLocation;
#[cfg(not(feature = "sled-backend"))]
use super::types::StorageError;
use super::types::StorageResult;

/// Open a key/value tree named `name` at `location`
///
/// Without the `sled-backend` feature, `Session` falls back to an in-memory
/// tree and `Durable` is rejected.
///
/// # Examples
/// ```ignore
/// let tree = open_storage_tree(&StorageLocation::Session, "session_storage")?;
/// tree.insert(b"key", b"value")?;
/// ```
pub fn open_storage_tree(
    location: &StorageLocation,
    name: &str,
) -> StorageResult<Box<dyn StorageTree>> {
    match location {
        #[cfg(feature = "sled-backend")]
        StorageLocation::Durable(path) => {
            use super::sled::SledTree;
            Ok(Box::new(SledTree::open(path, name)?) as Box<dyn StorageTree>)
        }
        #[cfg(not(feature = "sled-backend"))]
        StorageLocation::Durable(path) => Err(StorageError::Backend(format!(
            "durable storage at {} requires the sled-backend feature",
            path.display()
        ))),
        #[cfg(feature = "sled-backend")]
        StorageLocation::Session => {
            use super::sled::SledTree;
            Ok(Box::new(SledTree::temporary(name)?) as Box<dyn StorageTree>)
        }
        #[cfg(not(feature = "sled-backend"))]
        StorageLocation::Session => Ok(Box::new(MemoryTree::new()) as Box<dyn StorageTree>),
        StorageLocation::InMemory { quota_bytes } => {
            let tree = match quota_bytes {
                Some(quota) => MemoryTree::with_quota(*quota),
                None => MemoryTree::new(),
            };
            Ok(Box::new(tree) as Box<dyn StorageTree>)
        }
    }
}
