//! Durable key-value storage
//!
//! The timer and the service credentials live as JSON records under fixed
//! keys, mirroring the host storage the daemon replaces.

pub mod file_store;
pub mod memory_store;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Async key-value store holding opaque JSON records
pub trait KeyValueStore: Send + Sync {
    /// Read the record stored under `key`
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

    /// Write `value` under `key`; completes once the write is durable
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>>;

    /// Delete the records under `keys`
    fn remove<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>>;
}
