//! # zid-storage
//!
//! Storage abstraction layer for zid using RocksDB.
//!
//! Keys are encoded with bincode so composite keys such as
//! `(identity_id, credential_type)` sort by their first component and can be
//! range-scanned by prefix. Values are stored as JSON documents because
//! identity traits and credential configuration are open-ended.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod rocksdb_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};
