//! In-memory store

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, bail, Result};
use futures::{future::BoxFuture, FutureExt};
use serde_json::Value;

use super::KeyValueStore;

/// Volatile store, used for tests and for running without a state file.
///
/// Writes can be made to fail on demand to exercise persistence errors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set`/`remove` fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("storage is not writable");
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        async move {
            let records = self
                .records
                .lock()
                .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
            Ok(records.get(key).cloned())
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        async move {
            self.check_writable()?;
            let mut records = self
                .records
                .lock()
                .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
            records.insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }

    fn remove<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>> {
        async move {
            self.check_writable()?;
            let mut records = self
                .records
                .lock()
                .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
            for key in keys {
                records.remove(*key);
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}
