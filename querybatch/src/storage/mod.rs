// Copyright (c) 2024-2025 querybatch Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Byte-level key/value stores
//!
//! The durable and session-scoped cache backends keep their blobs in a
//! `StorageTree`, so the same code runs over sled or a plain map.
//!
//! ```text
//! PersistentCache (JSON blobs with expiry)
//!     ↓
//! StorageTree (key-value abstraction)
//!     ↓
//! Concrete Implementations (Sled, Memory)
//! ```

pub mod factory;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod traits;
pub mod types;

pub use factory::open_storage_tree;
pub use memory::MemoryTree;
pub use traits::StorageTree;
pub use types::{StorageError, StorageLocation, StorageResult, StorageType};
